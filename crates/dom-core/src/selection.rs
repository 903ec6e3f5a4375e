//! Caret and range bookkeeping for an editable area.
//!
//! `save` drops two invisible marker elements into the tree and hands back a
//! [`SelectionMarker`]; `restore` finds those elements again, wherever the
//! mutations in between moved them, and turns them back into a range.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::classify::{FRAGMENT_ATTR, SELECTION_MARKER_ATTR, is_block, is_normal_node, is_text};
use crate::dom::{Dom, NodeId};
use crate::range::{Boundary, Range, extract_contents};
use crate::walk;

/// Opaque handle returned by [`SelectionManager::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMarker {
    id: u64,
    collapsed: bool,
}

impl SelectionMarker {
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    fn start_id(&self) -> String {
        format!("manos-selection-{}-start", self.id)
    }

    fn end_id(&self) -> String {
        format!("manos-selection-{}-end", self.id)
    }
}

pub trait SelectionManager {
    /// The editable root that bounds every selection operation.
    fn area(&self) -> NodeId;

    fn range(&self) -> Option<Range>;

    fn set_range(&mut self, range: Option<Range>);

    fn is_collapsed(&self) -> bool {
        self.range().is_none_or(|range| range.is_collapsed())
    }

    /// The current range, or a caret at the start of the area.
    fn create_range(&self) -> Range {
        self.range()
            .unwrap_or_else(|| Range::collapsed(Boundary::start_of(self.area())))
    }

    fn save(&mut self, dom: &mut Dom) -> Option<SelectionMarker>;

    fn restore(&mut self, dom: &mut Dom, marker: Option<SelectionMarker>);

    /// Points the range back at the content between the markers of a saved
    /// selection, after changes that shifted child offsets around them.
    fn reselect(&mut self, dom: &Dom, marker: &SelectionMarker);

    /// Replaces the selected content with `node` and puts the caret after it.
    fn insert_node(&mut self, dom: &mut Dom, node: NodeId);

    fn set_cursor_in(&mut self, dom: &Dom, node: NodeId, at_start: bool);

    /// Wraps every contiguous run of selected inline content in a temporary
    /// fragment element and calls `callback` with each of them, in document
    /// order.
    fn each_selection(&mut self, dom: &mut Dom, callback: &mut dyn FnMut(&mut Dom, NodeId));
}

#[derive(Debug, Clone)]
pub struct Selection {
    area: NodeId,
    range: Option<Range>,
    next_marker: u64,
}

impl Selection {
    pub fn new(area: NodeId) -> Self {
        Self {
            area,
            range: None,
            next_marker: 0,
        }
    }

    pub fn with_range(area: NodeId, range: Range) -> Self {
        Self {
            range: Some(range),
            ..Self::new(area)
        }
    }

    pub fn select_node_contents(&mut self, dom: &Dom, node: NodeId) {
        self.range = Some(Range::select_node_contents(dom, node));
    }

    fn create_marker(&mut self, dom: &mut Dom, side: &str, id: &str) -> NodeId {
        let marker = dom.create_element(dom.realm(self.area), "span");
        dom.set_attr(marker, SELECTION_MARKER_ATTR, side);
        dom.set_attr(marker, "id", id);
        marker
    }

    fn between_markers(dom: &Dom, start: NodeId, end: Option<NodeId>) -> Option<Range> {
        match (Boundary::after(dom, start), end) {
            (Some(after_start), Some(end)) => {
                Boundary::before(dom, end).map(|before_end| Range {
                    start: after_start,
                    end: before_end,
                })
            }
            (Some(after_start), None) => Some(Range::collapsed(after_start)),
            _ => None,
        }
    }

    fn find_marker(&self, dom: &Dom, id: &str) -> Option<NodeId> {
        walk::query_all(dom, self.area, |dom, node| {
            dom.has_attr(node, SELECTION_MARKER_ATTR) && dom.attr(node, "id") == Some(id)
        })
        .into_iter()
        .next()
    }
}

impl SelectionManager for Selection {
    fn area(&self) -> NodeId {
        self.area
    }

    fn range(&self) -> Option<Range> {
        self.range
    }

    fn set_range(&mut self, range: Option<Range>) {
        self.range = range;
    }

    fn save(&mut self, dom: &mut Dom) -> Option<SelectionMarker> {
        let range = self.range?;
        let marker = SelectionMarker {
            id: self.next_marker,
            collapsed: range.is_collapsed(),
        };
        self.next_marker += 1;

        // The end goes in first so the start offsets stay valid.
        let end = if marker.collapsed {
            None
        } else {
            let end = self.create_marker(dom, "end", &marker.end_id());
            insert_at(dom, range.end, end);
            Some(end)
        };
        let start = self.create_marker(dom, "start", &marker.start_id());
        insert_at(dom, range.start, start);

        self.range = Self::between_markers(dom, start, end);
        tracing::trace!(id = marker.id, collapsed = marker.collapsed, "selection saved");
        Some(marker)
    }

    fn restore(&mut self, dom: &mut Dom, marker: Option<SelectionMarker>) {
        let Some(marker) = marker else {
            return;
        };
        let end = (!marker.collapsed)
            .then(|| self.find_marker(dom, &marker.end_id()))
            .flatten();
        let Some(start) = self.find_marker(dom, &marker.start_id()) else {
            tracing::warn!(id = marker.id, "selection start marker lost");
            if let Some(end) = end {
                dom.remove(end);
            }
            return;
        };

        let start_point = take_marker(dom, start);
        let end_point = end.and_then(|end| take_marker(dom, end));
        if !marker.collapsed && end_point.is_none() {
            tracing::warn!(id = marker.id, "selection end marker lost");
        }

        self.range = start_point.map(|start| Range {
            start,
            end: end_point.unwrap_or(start),
        });
        tracing::trace!(id = marker.id, "selection restored");
    }

    fn reselect(&mut self, dom: &Dom, marker: &SelectionMarker) {
        let Some(start) = self.find_marker(dom, &marker.start_id()) else {
            tracing::warn!(id = marker.id, "selection start marker lost");
            self.range = None;
            return;
        };
        let end = (!marker.collapsed)
            .then(|| self.find_marker(dom, &marker.end_id()))
            .flatten();
        self.range = Self::between_markers(dom, start, end);
    }

    fn insert_node(&mut self, dom: &mut Dom, node: NodeId) {
        let range = self
            .range
            .filter(|range| dom.contains(self.area, range.start.node));
        let Some(mut range) = range else {
            dom.append_child(self.area, node);
            self.range = Boundary::after(dom, node).map(Range::collapsed);
            return;
        };

        if !range.is_collapsed() {
            extract_contents(dom, &mut range);
        }
        insert_at(dom, range.start, node);
        self.range = Boundary::after(dom, node).map(Range::collapsed);
    }

    fn set_cursor_in(&mut self, dom: &Dom, node: NodeId, at_start: bool) {
        let mut target = node;
        loop {
            let child = if at_start {
                dom.first_child(target)
            } else {
                dom.last_child(target)
            };
            let point = match child {
                Some(child) if is_text(dom, child) => Some(if at_start {
                    Boundary::start_of(child)
                } else {
                    Boundary::end_of(dom, child)
                }),
                Some(child) if dom.first_child(child).is_some() => {
                    target = child;
                    continue;
                }
                Some(child) if at_start => Boundary::before(dom, child),
                Some(child) => Boundary::after(dom, child),
                None => Some(if at_start {
                    Boundary::start_of(target)
                } else {
                    Boundary::end_of(dom, target)
                }),
            };
            self.range = point.map(Range::collapsed);
            return;
        }
    }

    fn each_selection(&mut self, dom: &mut Dom, callback: &mut dyn FnMut(&mut Dom, NodeId)) {
        let Some(range) = self.range.filter(|range| !range.is_collapsed()) else {
            return;
        };
        let range = split_text_boundaries(dom, range);
        self.range = Some(range);

        let area = self.area;
        let realm = dom.realm(area);
        let mut selected: Vec<NodeId> = Vec::new();
        walk::all(
            dom,
            area,
            |dom, node| {
                if node == area || is_block(dom, node, realm) {
                    return false;
                }
                if range.contains_node(dom, node) {
                    selected.push(node);
                    return true;
                }
                false
            },
            false,
        );

        let mut runs: Vec<Vec<NodeId>> = Vec::new();
        for node in selected {
            match runs.last_mut() {
                Some(run) if run.last().and_then(|&last| dom.next_sibling(last)) == Some(node) => {
                    run.push(node);
                }
                _ => runs.push(vec![node]),
            }
        }

        let mut fragments = Vec::with_capacity(runs.len());
        for run in runs {
            if !run.iter().any(|&node| is_normal_node(dom, node)) {
                continue;
            }
            let Some(parent) = dom.parent(run[0]) else {
                continue;
            };
            let fragment = dom.create_element(realm, "font");
            dom.set_attr(fragment, FRAGMENT_ATTR, "true");
            dom.insert_before(parent, fragment, Some(run[0]));
            for node in run {
                dom.append_child(fragment, node);
            }
            fragments.push(fragment);
        }

        tracing::trace!(count = fragments.len(), "selection split into fragments");
        for fragment in fragments {
            callback(dom, fragment);
        }
    }
}

/// Inserts `node` at a boundary point, splitting a text node when the point
/// falls inside it.
pub fn insert_at(dom: &mut Dom, point: Boundary, node: NodeId) {
    if is_text(dom, point.node) {
        let Some(parent) = dom.parent(point.node) else {
            return;
        };
        if point.offset == 0 {
            dom.insert_before(parent, node, Some(point.node));
        } else if point.offset >= dom.node_len(point.node) {
            let next = dom.next_sibling(point.node);
            dom.insert_before(parent, node, next);
        } else if let Some(tail) = dom.split_text(point.node, point.offset) {
            dom.insert_before(parent, node, Some(tail));
        }
        return;
    }

    let reference = dom.children(point.node).get(point.offset).copied();
    dom.insert_before(point.node, node, reference);
}

/// Removes a marker element and returns the point it occupied, anchored in a
/// neighbouring text node when there is one so that later text merges keep it
/// valid.
fn take_marker(dom: &mut Dom, marker: NodeId) -> Option<Boundary> {
    let prev = dom.prev_sibling(marker);
    let next = dom.next_sibling(marker);
    let point = if let Some(prev) = prev.filter(|&prev| is_text(dom, prev)) {
        Some(Boundary::end_of(dom, prev))
    } else if let Some(next) = next.filter(|&next| is_text(dom, next)) {
        Some(Boundary::start_of(next))
    } else {
        Boundary::before(dom, marker)
    };
    dom.remove(marker);
    point
}

/// Splits text nodes cut by the range so that every boundary sits between
/// nodes.
fn split_text_boundaries(dom: &mut Dom, range: Range) -> Range {
    let Range { start, mut end } = range;

    if is_text(dom, end.node) {
        let len = dom.node_len(end.node);
        end = if end.offset == 0 {
            Boundary::before(dom, end.node).unwrap_or(end)
        } else if end.offset >= len {
            Boundary::after(dom, end.node).unwrap_or(end)
        } else {
            dom.split_text(end.node, end.offset);
            Boundary::after(dom, end.node).unwrap_or(end)
        };
    }

    let start = if is_text(dom, start.node) {
        let len = dom.node_len(start.node);
        if start.offset == 0 {
            Boundary::before(dom, start.node).unwrap_or(start)
        } else if start.offset >= len {
            Boundary::after(dom, start.node).unwrap_or(start)
        } else {
            let node = start.node;
            let tail = dom.split_text(node, start.offset);
            if let Some(tail) = tail
                && end.node == dom.parent(node).unwrap_or(node)
                && end.offset > dom.index_of(node).unwrap_or(usize::MAX)
            {
                end.offset += 1;
            }
            tail.and_then(|tail| Boundary::before(dom, tail))
                .unwrap_or(start)
        }
    } else {
        start
    };

    Range { start, end }
}

/// Runs `f` between a save and a restore of `selection`. The restore happens
/// whatever `f` returns, `Err` included, and before a panic in `f` is
/// propagated.
pub fn preserve_selection<S, R>(
    dom: &mut Dom,
    selection: &mut S,
    f: impl FnOnce(&mut Dom, &mut S) -> R,
) -> R
where
    S: SelectionManager + ?Sized,
{
    let marker = selection.save(dom);
    let result = panic::catch_unwind(AssertUnwindSafe(|| f(dom, selection)));
    selection.restore(dom, marker);
    result.unwrap_or_else(|payload| panic::resume_unwind(payload))
}
