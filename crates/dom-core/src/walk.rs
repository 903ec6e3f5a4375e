//! Directional searches bounded by an explicit root.
//!
//! None of these functions look at ancestors above the `root` they are given,
//! and the callback based ones snapshot what they need before calling out, so
//! callers may restructure the tree from inside a visitor.

use crate::dom::{Dom, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

fn sibling(dom: &Dom, node: NodeId, dir: Direction) -> Option<NodeId> {
    match dir {
        Direction::Forward => dom.next_sibling(node),
        Direction::Backward => dom.prev_sibling(node),
    }
}

fn child(dom: &Dom, node: NodeId, dir: Direction) -> Option<NodeId> {
    match dir {
        Direction::Forward => dom.first_child(node),
        Direction::Backward => dom.last_child(node),
    }
}

pub fn find(
    dom: &Dom,
    node: NodeId,
    mut condition: impl FnMut(&Dom, NodeId) -> bool,
    root: NodeId,
    recurse: bool,
    sibling_dir: Direction,
    child_dir: Option<Direction>,
) -> Option<NodeId> {
    find_inner(dom, node, &mut condition, root, recurse, sibling_dir, child_dir)
}

fn find_inner(
    dom: &Dom,
    node: NodeId,
    condition: &mut dyn FnMut(&Dom, NodeId) -> bool,
    root: NodeId,
    recurse: bool,
    sibling_dir: Direction,
    child_dir: Option<Direction>,
) -> Option<NodeId> {
    if recurse {
        if condition(dom, node) {
            return Some(node);
        }
        if let Some(first) = child_dir.and_then(|dir| child(dom, node, dir)) {
            let found = find_inner(dom, first, condition, node, true, sibling_dir, child_dir);
            if found.is_some() {
                return found;
            }
        }
    }
    if node == root {
        return None;
    }

    let mut start = node;
    loop {
        let next = sibling(dom, start, sibling_dir);
        let step = match next {
            Some(next) => {
                if condition(dom, next) {
                    return Some(next);
                }
                if let Some(first) = child_dir.and_then(|dir| child(dom, next, dir)) {
                    let found = find_inner(dom, first, condition, next, true, sibling_dir, child_dir);
                    if found.is_some() {
                        return found;
                    }
                }
                Some(next)
            }
            None => dom.parent(start),
        };

        match step {
            Some(step) if step != root => start = step,
            _ => return None,
        }
    }
}

/// First node after `node` in document order (siblings, their subtrees, then
/// the parent's following siblings) that satisfies `condition`.
pub fn next(
    dom: &Dom,
    node: NodeId,
    condition: impl FnMut(&Dom, NodeId) -> bool,
    root: NodeId,
) -> Option<NodeId> {
    find(
        dom,
        node,
        condition,
        root,
        false,
        Direction::Forward,
        Some(Direction::Forward),
    )
}

pub fn prev(
    dom: &Dom,
    node: NodeId,
    condition: impl FnMut(&Dom, NodeId) -> bool,
    root: NodeId,
) -> Option<NodeId> {
    find(
        dom,
        node,
        condition,
        root,
        false,
        Direction::Backward,
        Some(Direction::Backward),
    )
}

/// `node` itself or its nearest ancestor satisfying `condition`. The root is
/// never tested.
pub fn up(
    dom: &Dom,
    node: NodeId,
    mut condition: impl FnMut(&Dom, NodeId) -> bool,
    root: NodeId,
) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == root {
            return None;
        }
        if condition(dom, n) {
            return Some(n);
        }
        current = dom.parent(n);
    }
    None
}

pub enum Matcher<'a> {
    Tag(&'a str),
    Tags(&'a [&'a str]),
    Predicate(&'a dyn Fn(&Dom, NodeId) -> bool),
}

impl Matcher<'_> {
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        match self {
            Matcher::Tag(tag) => dom.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            Matcher::Tags(tags) => dom
                .tag(node)
                .is_some_and(|t| tags.iter().any(|tag| t.eq_ignore_ascii_case(tag))),
            Matcher::Predicate(predicate) => predicate(dom, node),
        }
    }
}

impl<'a> From<&'a str> for Matcher<'a> {
    fn from(tag: &'a str) -> Self {
        Matcher::Tag(tag)
    }
}

impl<'a> From<&'a [&'a str]> for Matcher<'a> {
    fn from(tags: &'a [&'a str]) -> Self {
        Matcher::Tags(tags)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for Matcher<'a> {
    fn from(tags: &'a [&'a str; N]) -> Self {
        Matcher::Tags(tags.as_slice())
    }
}

pub fn closest<'a>(
    dom: &Dom,
    node: NodeId,
    matcher: impl Into<Matcher<'a>>,
    root: NodeId,
) -> Option<NodeId> {
    let matcher = matcher.into();
    up(dom, node, |dom, n| matcher.matches(dom, n), root)
}

/// Pre-order visit of the subtree rooted at `node`. A `true` result from the
/// visitor stops the descent into that node's children; only the root call
/// reports it back.
pub fn all(
    dom: &Dom,
    node: NodeId,
    mut condition: impl FnMut(&Dom, NodeId) -> bool,
    reverse: bool,
) -> Option<NodeId> {
    all_inner(dom, node, &mut condition, reverse)
}

fn all_inner(
    dom: &Dom,
    node: NodeId,
    condition: &mut dyn FnMut(&Dom, NodeId) -> bool,
    reverse: bool,
) -> Option<NodeId> {
    let mut children = dom.children(node).to_vec();
    if condition(dom, node) {
        return Some(node);
    }
    if reverse {
        children.reverse();
    }
    for child in children {
        all_inner(dom, child, condition, reverse);
    }
    None
}

/// Pre-order visit of every descendant of `node`. Returning `false` from the
/// callback aborts the walk. The callback may detach the node it is given.
pub fn each(
    dom: &mut Dom,
    node: NodeId,
    mut callback: impl FnMut(&mut Dom, NodeId) -> bool,
) -> bool {
    each_inner(dom, node, &mut callback)
}

fn each_inner(
    dom: &mut Dom,
    node: NodeId,
    callback: &mut dyn FnMut(&mut Dom, NodeId) -> bool,
) -> bool {
    let mut current = dom.first_child(node);
    while let Some(n) = current {
        let next = dom.next_sibling(n);
        if !callback(dom, n) {
            return false;
        }
        if !each_inner(dom, n, callback) {
            return false;
        }
        current = next;
    }
    true
}

/// Collects every node of the subtree (pre-order, root included) matching
/// `condition`.
pub fn query_all(
    dom: &Dom,
    node: NodeId,
    mut condition: impl FnMut(&Dom, NodeId) -> bool,
) -> Vec<NodeId> {
    let mut found = Vec::new();
    all(
        dom,
        node,
        |dom, n| {
            if condition(dom, n) {
                found.push(n);
            }
            false
        },
        false,
    );
    found
}
