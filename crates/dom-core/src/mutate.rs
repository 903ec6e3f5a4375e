//! Tree-shape changes that keep content: wrapping, unwrapping, replacing and
//! moving nodes. Every function tolerates nodes that have already been
//! detached by returning early instead of failing.

use crate::classify::{INVISIBLE_SPACE, is_block, is_text};
use crate::dom::{Dom, NodeId, Realm};
use crate::selection::SelectionManager;

/// Creates elements in the document that will own them.
pub trait ElementFactory {
    fn element(&self, dom: &mut Dom, tag: &str) -> NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFactory {
    realm: Realm,
}

impl NodeFactory {
    pub fn new(realm: Realm) -> Self {
        Self { realm }
    }

    pub fn for_node(dom: &Dom, node: NodeId) -> Self {
        Self::new(dom.realm(node))
    }

    pub fn realm(&self) -> Realm {
        self.realm
    }

    pub fn text(&self, dom: &mut Dom, text: impl Into<String>) -> NodeId {
        dom.create_text(self.realm, text)
    }

    pub fn fragment(&self, dom: &mut Dom) -> NodeId {
        dom.create_fragment(self.realm)
    }
}

impl ElementFactory for NodeFactory {
    fn element(&self, dom: &mut Dom, tag: &str) -> NodeId {
        dom.create_element(self.realm, tag)
    }
}

/// Either a tag to create or an existing element to use as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewElement<'a> {
    Tag(&'a str),
    Node(NodeId),
}

impl NewElement<'_> {
    fn resolve(self, dom: &mut Dom, factory: &dyn ElementFactory) -> NodeId {
        match self {
            NewElement::Tag(tag) => factory.element(dom, tag),
            NewElement::Node(node) => node,
        }
    }
}

impl<'a> From<&'a str> for NewElement<'a> {
    fn from(tag: &'a str) -> Self {
        NewElement::Tag(tag)
    }
}

impl From<NodeId> for NewElement<'_> {
    fn from(node: NodeId) -> Self {
        NewElement::Node(node)
    }
}

/// Moves every sibling strictly between `before` and `after` (either end
/// open when `None`) into `wrapper`, which takes their place.
fn wrap_between(
    dom: &mut Dom,
    parent: NodeId,
    before: Option<NodeId>,
    after: Option<NodeId>,
    wrapper: NodeId,
) {
    let children = dom.children(parent).to_vec();
    let from = before
        .and_then(|b| children.iter().position(|&c| c == b))
        .map(|ix| ix + 1)
        .unwrap_or(0);
    let to = after
        .and_then(|a| children.iter().position(|&c| c == a))
        .unwrap_or(children.len());
    let Some(run) = children.get(from..to).filter(|run| !run.is_empty()) else {
        return;
    };

    dom.insert_before(parent, wrapper, Some(run[0]));
    for &node in run {
        dom.append_child(wrapper, node);
    }
}

/// Puts `node` inside a new or given wrapper at its current position.
/// Returns `None` for a detached node.
///
/// Saving the selection may split `node` when a boundary falls inside its
/// text, so the wrapper takes the node's original extent: everything up to
/// the sibling that followed it before the selection was saved.
pub fn wrap<'a>(
    dom: &mut Dom,
    node: NodeId,
    wrapper: impl Into<NewElement<'a>>,
    factory: &dyn ElementFactory,
    mut selection: Option<&mut dyn SelectionManager>,
) -> Option<NodeId> {
    let parent = dom.parent(node)?;
    let before = dom.prev_sibling(node);
    let after = dom.next_sibling(node);
    let wrapper = wrapper.into().resolve(dom, factory);

    let marker = selection.as_deref_mut().and_then(|sel| sel.save(dom));
    wrap_between(dom, parent, before, after, wrapper);
    if let Some(sel) = selection {
        sel.restore(dom, marker);
    }
    Some(wrapper)
}

/// Wraps `node` together with all adjacent non-block siblings on both sides.
pub fn wrap_inline<'a>(
    dom: &mut Dom,
    node: NodeId,
    wrapper: impl Into<NewElement<'a>>,
    factory: &dyn ElementFactory,
    mut selection: Option<&mut dyn SelectionManager>,
) -> Option<NodeId> {
    let parent = dom.parent(node)?;
    let realm = dom.realm(node);

    let mut before = dom.prev_sibling(node);
    while let Some(prev) = before.filter(|&prev| !is_block(dom, prev, realm)) {
        before = dom.prev_sibling(prev);
    }
    let mut after = dom.next_sibling(node);
    while let Some(next) = after.filter(|&next| !is_block(dom, next, realm)) {
        after = dom.next_sibling(next);
    }

    let wrapper = wrapper.into().resolve(dom, factory);
    let marker = selection.as_deref_mut().and_then(|sel| sel.save(dom));
    wrap_between(dom, parent, before, after, wrapper);
    if let Some(sel) = selection {
        sel.restore(dom, marker);
    }
    Some(wrapper)
}

/// Replaces `node` by its children, keeping their order.
pub fn unwrap(dom: &mut Dom, node: NodeId) {
    let Some(parent) = dom.parent(node) else {
        return;
    };
    let children = dom.children(node).to_vec();
    for child in children {
        dom.insert_before(parent, child, Some(node));
    }
    dom.remove(node);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOptions {
    pub with_attributes: bool,
    pub move_content: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            with_attributes: false,
            move_content: true,
        }
    }
}

pub fn replace<'a>(
    dom: &mut Dom,
    elm: NodeId,
    new: impl Into<NewElement<'a>>,
    factory: &dyn ElementFactory,
    options: ReplaceOptions,
) -> NodeId {
    let replacement = new.into().resolve(dom, factory);
    if replacement == elm {
        return elm;
    }

    if options.move_content {
        let children = dom.children(elm).to_vec();
        for child in children {
            dom.append_child(replacement, child);
        }
    }

    if options.with_attributes
        && let Some(attrs) = dom.element(elm).map(|el| el.attrs.clone())
    {
        for (name, value) in attrs {
            dom.set_attr(replacement, &name, value);
        }
    }

    dom.replace_child(elm, replacement);
    replacement
}

/// Moves all children of `from` into `to` through a holding fragment.
pub fn move_content(dom: &mut Dom, from: NodeId, to: NodeId, at_start: bool) {
    let fragment = dom.create_fragment(dom.realm(from));
    let children = dom.children(from).to_vec();
    for child in children {
        dom.append_child(fragment, child);
    }

    if at_start {
        let first = dom.first_child(to);
        dom.insert_before(to, fragment, first);
    } else {
        dom.append_child(to, fragment);
    }
}

pub fn append_child_first(dom: &mut Dom, root: NodeId, new: NodeId) {
    let first = dom.first_child(root);
    dom.insert_before(root, new, first);
}

pub fn after(dom: &mut Dom, elm: NodeId, new: NodeId) {
    let Some(parent) = dom.parent(elm) else {
        return;
    };
    let next = dom.next_sibling(elm);
    dom.insert_before(parent, new, next);
}

pub fn safe_remove(dom: &mut Dom, node: NodeId) {
    if dom.parent(node).is_some() {
        dom.remove(node);
    }
}

/// Removes every child of `node`.
pub fn detach(dom: &mut Dom, node: NodeId) {
    while let Some(child) = dom.first_child(node) {
        dom.remove(child);
    }
}

/// Merges adjacent text siblings from `node` onward (descending into
/// elements), dropping invisible spaces from merged text.
pub fn normalize_node(dom: &mut Dom, node: Option<NodeId>) {
    let mut current = node;
    while let Some(n) = current {
        if is_text(dom, n) && dom.parent(n).is_some() {
            while let Some(next) = dom.next_sibling(n).filter(|&next| is_text(dom, next)) {
                let merged = format!(
                    "{}{}",
                    dom.text(n).unwrap_or_default(),
                    dom.text(next).unwrap_or_default()
                )
                .replace(INVISIBLE_SPACE, "");
                dom.set_text(n, merged);
                dom.remove(next);
            }
        } else {
            let first = dom.first_child(n);
            normalize_node(dom, first);
        }
        current = dom.next_sibling(n);
    }
}
