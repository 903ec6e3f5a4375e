//! Compact notation for a tree plus a selection: `[` and `]` mark the ends of
//! a range and `|` marks a caret, e.g. `<p>Tex[t to te]xt</p>`.
//!
//! The brackets are plain characters, so they cannot appear inside attribute
//! values or text that is meant literally.

use crate::dom::{Dom, NodeId};
use crate::html::{inner_html_with_range, parse_html_into};
use crate::range::{Boundary, Range};
use crate::selection::{Selection, SelectionManager};
use crate::walk;

const POINT_TAG: &str = "manos-point";
const POINT_ATTR: &str = "data-point";

/// Parses marked HTML into `area` and returns a selection over it.
pub fn parse_marked(dom: &mut Dom, area: NodeId, marked: &str) -> Selection {
    let mut html = String::with_capacity(marked.len() + 64);
    for ch in marked.chars() {
        match ch {
            '[' => html.push_str(&point_tag("start")),
            ']' => html.push_str(&point_tag("end")),
            '|' => html.push_str(&point_tag("caret")),
            ch => html.push(ch),
        }
    }
    parse_html_into(dom, area, &html);

    let point = |dom: &mut Dom, kind: &str| {
        let node = walk::query_all(dom, area, |dom, node| {
            dom.tag(node) == Some(POINT_TAG) && dom.attr(node, POINT_ATTR) == Some(kind)
        })
        .into_iter()
        .next()?;
        let at = Boundary::before(dom, node);
        dom.remove(node);
        at
    };

    let range = if let Some(caret) = point(dom, "caret") {
        Some(Range::collapsed(caret))
    } else {
        let start = point(dom, "start");
        let end = point(dom, "end");
        match (start, end) {
            (Some(start), Some(end)) => Some(Range { start, end }),
            (Some(at), None) | (None, Some(at)) => Some(Range::collapsed(at)),
            (None, None) => None,
        }
    };

    let range = range.map(|range| {
        let mut points = [range.start, range.end];
        merge_text_runs(dom, area, &mut points);
        anchor_in_text(
            dom,
            Range {
                start: points[0],
                end: points[1],
            },
        )
    });

    let mut selection = Selection::new(area);
    selection.set_range(range);
    selection
}

/// Serializes `area` with the selection's range written in marked notation.
pub fn to_marked(dom: &Dom, selection: &dyn SelectionManager) -> String {
    inner_html_with_range(dom, selection.area(), selection.range())
}

fn point_tag(kind: &str) -> String {
    format!("<{POINT_TAG} {POINT_ATTR}=\"{kind}\"></{POINT_TAG}>")
}

/// Merges the adjacent text nodes left behind by the removed point tags,
/// moving `points` along with the merged text.
fn merge_text_runs(dom: &mut Dom, root: NodeId, points: &mut [Boundary]) {
    let parents = walk::query_all(dom, root, |dom, node| dom.children(node).len() > 1);
    for parent in parents {
        let mut ix = 0;
        while ix + 1 < dom.children(parent).len() {
            let (head, tail) = (dom.children(parent)[ix], dom.children(parent)[ix + 1]);
            let (Some(a), Some(b)) = (dom.text(head), dom.text(tail)) else {
                ix += 1;
                continue;
            };
            let head_len = a.chars().count();
            let merged = format!("{a}{b}");
            dom.set_text(head, merged);
            dom.remove(tail);

            for point in points.iter_mut() {
                if point.node == tail {
                    *point = Boundary::new(head, head_len + point.offset);
                } else if point.node == parent && point.offset == ix + 1 {
                    *point = Boundary::new(head, head_len);
                } else if point.node == parent && point.offset > ix + 1 {
                    point.offset -= 1;
                }
            }
        }
    }
}

/// Element-relative points next to a text node move into it, so that a
/// marked string read back out prints the same way.
fn anchor_in_text(dom: &Dom, range: Range) -> Range {
    let anchor = |point: Boundary| {
        let children = dom.children(point.node);
        if let Some(&before) = point
            .offset
            .checked_sub(1)
            .and_then(|ix| children.get(ix))
            .filter(|&&node| dom.text(node).is_some())
        {
            return Boundary::end_of(dom, before);
        }
        if let Some(&after) = children
            .get(point.offset)
            .filter(|&&node| dom.text(node).is_some())
        {
            return Boundary::start_of(after);
        }
        point
    };
    Range {
        start: anchor(range.start),
        end: anchor(range.end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(dom: &mut Dom) -> NodeId {
        let doc = dom.create_document();
        let area = dom.create_element(dom.realm(doc), "div");
        dom.append_child(doc, area);
        area
    }

    #[test]
    fn range_survives_a_round_trip() {
        let mut dom = Dom::new();
        let area = area(&mut dom);
        let selection = parse_marked(&mut dom, area, "<p>Tex[t to te]xt</p>");
        assert_eq!(to_marked(&dom, &selection), "<p>Tex[t to te]xt</p>");
    }

    #[test]
    fn marks_do_not_leave_split_text_behind() {
        let mut dom = Dom::new();
        let area = area(&mut dom);
        let selection = parse_marked(&mut dom, area, "ab[cd]ef");
        assert_eq!(dom.children(area).len(), 1);
        let text = dom.children(area)[0];
        assert_eq!(
            selection.range(),
            Some(Range {
                start: Boundary::new(text, 2),
                end: Boundary::new(text, 4),
            })
        );
    }

    #[test]
    fn caret_between_elements() {
        let mut dom = Dom::new();
        let area = area(&mut dom);
        let selection = parse_marked(&mut dom, area, "<p><b>a</b>|<i>b</i></p>");
        assert!(selection.is_collapsed());
        assert_eq!(to_marked(&dom, &selection), "<p><b>a</b>|<i>b</i></p>");
    }
}
