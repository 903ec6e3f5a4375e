use std::cmp::Ordering;

use crate::classify::{is_comment, is_text};
use crate::dom::{Dom, NodeId, char_to_byte};

/// A DOM boundary point: a character offset inside text, a child index
/// anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    pub fn before(dom: &Dom, node: NodeId) -> Option<Self> {
        Some(Self::new(dom.parent(node)?, dom.index_of(node)?))
    }

    pub fn after(dom: &Dom, node: NodeId) -> Option<Self> {
        Some(Self::new(dom.parent(node)?, dom.index_of(node)? + 1))
    }

    pub fn start_of(node: NodeId) -> Self {
        Self::new(node, 0)
    }

    pub fn end_of(dom: &Dom, node: NodeId) -> Self {
        Self::new(node, dom.node_len(node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    /// Orders the two points so that `start` never follows `end`.
    pub fn new(dom: &Dom, a: Boundary, b: Boundary) -> Self {
        if compare_boundaries(dom, a, b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn collapsed(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    pub fn select_node(dom: &Dom, node: NodeId) -> Option<Self> {
        Some(Self {
            start: Boundary::before(dom, node)?,
            end: Boundary::after(dom, node)?,
        })
    }

    pub fn select_node_contents(dom: &Dom, node: NodeId) -> Self {
        Self {
            start: Boundary::start_of(node),
            end: Boundary::end_of(dom, node),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    /// Whether the whole of `node` lies inside the range. Detached nodes are
    /// never contained.
    pub fn contains_node(&self, dom: &Dom, node: NodeId) -> bool {
        let (Some(before), Some(after)) = (Boundary::before(dom, node), Boundary::after(dom, node))
        else {
            return false;
        };
        compare_boundaries(dom, before, self.start) != Ordering::Less
            && compare_boundaries(dom, after, self.end) != Ordering::Greater
    }

    pub fn common_ancestor(&self, dom: &Dom) -> NodeId {
        let mut candidate = self.start.node;
        while !dom.contains(candidate, self.end.node) {
            match dom.parent(candidate) {
                Some(parent) => candidate = parent,
                None => break,
            }
        }
        candidate
    }
}

fn tree_path(dom: &Dom, node: NodeId) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node;
    while let Some(ix) = dom.index_of(current) {
        path.push(ix);
        current = dom.parent(current).unwrap_or(current);
    }
    path.reverse();
    path
}

fn child_containing(dom: &Dom, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        let parent = dom.parent(current)?;
        if parent == ancestor {
            return Some(current);
        }
        current = parent;
    }
}

/// Document-order comparison of two boundary points.
pub fn compare_boundaries(dom: &Dom, a: Boundary, b: Boundary) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    if dom.contains(a.node, b.node) {
        let Some(child) = child_containing(dom, a.node, b.node) else {
            return Ordering::Equal;
        };
        let ix = dom.index_of(child).unwrap_or(0);
        return if a.offset <= ix {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    if dom.contains(b.node, a.node) {
        return compare_boundaries(dom, b, a).reverse();
    }
    tree_path(dom, a.node).cmp(&tree_path(dom, b.node))
}

fn substring(text: &str, from: usize, to: usize) -> String {
    let from = char_to_byte(text, from);
    let to = char_to_byte(text, to).max(from);
    text[from..to].to_string()
}

fn remove_chars(dom: &mut Dom, node: NodeId, from: usize, to: usize) {
    let Some(text) = dom.text(node) else {
        return;
    };
    let next = format!(
        "{}{}",
        substring(text, 0, from),
        substring(text, to, usize::MAX)
    );
    dom.set_text(node, next);
}

fn clone_with_text(dom: &mut Dom, node: NodeId, from: usize, to: usize) -> NodeId {
    let data = dom.text(node).map(|t| substring(t, from, to));
    let copy = dom.clone_node(node, false);
    if let Some(data) = data {
        dom.set_text(copy, data);
    }
    copy
}

/// Moves the contents of `range` out of the tree into a new fragment,
/// cloning the partially selected ancestors on either side, and collapses the
/// range to where the contents used to be.
pub fn extract_contents(dom: &mut Dom, range: &mut Range) -> NodeId {
    let realm = dom.realm(range.start.node);
    let fragment = dom.create_fragment(realm);
    if range.is_collapsed() {
        return fragment;
    }

    let Range { start, end } = *range;

    if start.node == end.node && (is_text(dom, start.node) || is_comment(dom, start.node)) {
        let copy = clone_with_text(dom, start.node, start.offset, end.offset);
        dom.append_child(fragment, copy);
        remove_chars(dom, start.node, start.offset, end.offset);
        range.collapse(true);
        return fragment;
    }

    let common = range.common_ancestor(dom);

    let first_partial = if dom.contains(start.node, end.node) {
        None
    } else {
        child_containing(dom, common, start.node)
    };
    let last_partial = if dom.contains(end.node, start.node) {
        None
    } else {
        child_containing(dom, common, end.node)
    };

    let contained: Vec<NodeId> = dom
        .children(common)
        .iter()
        .copied()
        .filter(|&child| range.contains_node(dom, child))
        .collect();

    let collapse_to = if dom.contains(start.node, end.node) {
        start
    } else {
        let mut reference = start.node;
        while let Some(parent) = dom.parent(reference) {
            if dom.contains(parent, end.node) {
                break;
            }
            reference = parent;
        }
        Boundary::after(dom, reference).unwrap_or(start)
    };

    if let Some(first) = first_partial {
        if is_text(dom, first) || is_comment(dom, first) {
            let len = dom.node_len(start.node);
            let copy = clone_with_text(dom, start.node, start.offset, len);
            dom.append_child(fragment, copy);
            remove_chars(dom, start.node, start.offset, len);
        } else {
            let copy = dom.clone_node(first, false);
            dom.append_child(fragment, copy);
            let mut sub = Range {
                start,
                end: Boundary::end_of(dom, first),
            };
            let sub_fragment = extract_contents(dom, &mut sub);
            dom.append_child(copy, sub_fragment);
        }
    }

    for child in contained {
        dom.append_child(fragment, child);
    }

    if let Some(last) = last_partial {
        if is_text(dom, last) || is_comment(dom, last) {
            let copy = clone_with_text(dom, end.node, 0, end.offset);
            dom.append_child(fragment, copy);
            remove_chars(dom, end.node, 0, end.offset);
        } else {
            let copy = dom.clone_node(last, false);
            dom.append_child(fragment, copy);
            let mut sub = Range {
                start: Boundary::start_of(last),
                end,
            };
            let sub_fragment = extract_contents(dom, &mut sub);
            dom.append_child(copy, sub_fragment);
        }
    }

    *range = Range::collapsed(collapse_to);
    fragment
}

/// Number of characters of text inside `root` that precede `point`.
pub fn text_offset(dom: &Dom, root: NodeId, point: Boundary) -> usize {
    let mut offset = 0;
    crate::walk::all(
        dom,
        root,
        |dom, node| {
            let Some(text) = dom.text(node) else {
                return false;
            };
            let len = text.chars().count();
            if node == point.node {
                offset += point.offset.min(len);
            } else if compare_boundaries(dom, Boundary::end_of(dom, node), point) != Ordering::Greater {
                offset += len;
            }
            false
        },
        false,
    );
    offset
}
