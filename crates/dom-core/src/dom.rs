use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Attrs = BTreeMap<String, String>;

/// Handle of a node stored in a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of the document a node was created in.
///
/// Two documents living in the same arena (a host page and the document of an
/// iframe, for instance) have distinct realms, and realm-aware type checks
/// reject nodes that belong to the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Realm(u32);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Attrs,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    realm: Realm,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<NodeData>,
    documents: Vec<NodeId>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_document(&mut self) -> NodeId {
        let realm = Realm(self.documents.len() as u32);
        let id = self.push(NodeKind::Document, realm);
        self.documents.push(id);
        id
    }

    pub fn document(&self, realm: Realm) -> Option<NodeId> {
        self.documents.get(realm.0 as usize).copied()
    }

    pub fn realm(&self, node: NodeId) -> Realm {
        self.nodes[node.0].realm
    }

    pub fn create_element(&mut self, realm: Realm, tag: &str) -> NodeId {
        self.push(
            NodeKind::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attrs: Attrs::new(),
            }),
            realm,
        )
    }

    pub fn create_text(&mut self, realm: Realm, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()), realm)
    }

    pub fn create_comment(&mut self, realm: Realm, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()), realm)
    }

    pub fn create_fragment(&mut self, realm: Realm) -> NodeId {
        self.push(NodeKind::Fragment, realm)
    }

    fn push(&mut self, kind: NodeKind, realm: Realm) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            realm,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, node: NodeId, value: impl Into<String>) {
        if let NodeKind::Text(text) = &mut self.nodes[node.0].kind {
            *text = value.into();
        }
    }

    /// Length of a node in boundary-point units: characters for text and
    /// comments, children for everything else.
    pub fn node_len(&self, node: NodeId) -> usize {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.chars().count(),
            _ => self.nodes[node.0].children.len(),
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.insert(name.to_ascii_lowercase(), value.into());
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node)?.attrs.remove(name)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.last().copied()
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.nodes[parent.0].children.iter().position(|&c| c == node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let ix = self.index_of(node)?;
        self.nodes[parent.0].children.get(ix + 1).copied()
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let ix = self.index_of(node)?;
        ix.checked_sub(1)
            .and_then(|ix| self.nodes[parent.0].children.get(ix).copied())
    }

    /// Inclusive ancestor test.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when the
    /// reference is `None` or not a child of `parent`. A fragment child has its
    /// children moved instead and is left empty.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.contains(child, parent) {
            tracing::warn!(?parent, ?child, "refusing to insert a node into its own subtree");
            return;
        }

        if matches!(self.nodes[child.0].kind, NodeKind::Fragment) {
            let moved = std::mem::take(&mut self.nodes[child.0].children);
            for node in moved {
                self.nodes[node.0].parent = None;
                self.insert_before(parent, node, reference);
            }
            return;
        }

        if reference == Some(child) {
            return;
        }

        self.detach_from_parent(child);
        let children = &mut self.nodes[parent.0].children;
        let ix = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(ix, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detaches `node` from its parent. Returns `false` if it had none.
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.detach_from_parent(node)
    }

    pub fn replace_child(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        if old == new {
            return;
        }
        self.insert_before(parent, new, Some(old));
        self.detach_from_parent(old);
    }

    fn detach_from_parent(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|&c| c != node);
        true
    }

    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let kind = self.nodes[node.0].kind.clone();
        let realm = self.nodes[node.0].realm;
        let copy = self.push(kind, realm);
        if deep {
            let children = self.nodes[node.0].children.clone();
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.append_child(copy, child_copy);
            }
        }
        copy
    }

    /// Splits a text node at a character offset, inserting the tail as a new
    /// sibling. Returns the tail node.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(node)?;
        let byte_ix = char_to_byte(text, offset);
        let tail = text[byte_ix..].to_string();
        let head = text[..byte_ix].to_string();
        self.set_text(node, head);
        let realm = self.realm(node);
        let tail_node = self.create_text(realm, tail);
        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert_before(parent, tail_node, next);
        }
        Some(tail_node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            _ => {
                for &child in &self.nodes[node.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

pub(crate) fn char_to_byte(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(ix, _)| ix)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_fragment_moves_children_and_empties_fragment() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let div = dom.create_element(realm, "DIV");
        dom.append_child(doc, div);

        let fragment = dom.create_fragment(realm);
        let a = dom.create_text(realm, "a");
        let b = dom.create_element(realm, "b");
        dom.append_child(fragment, a);
        dom.append_child(fragment, b);

        dom.append_child(div, fragment);
        assert_eq!(dom.children(div), &[a, b]);
        assert!(dom.children(fragment).is_empty());
        assert_eq!(dom.tag(div), Some("div"));
    }

    #[test]
    fn split_text_counts_characters() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let text = dom.create_text(realm, "héllo");
        dom.append_child(doc, text);

        let tail = dom.split_text(text, 2).unwrap();
        assert_eq!(dom.text(text), Some("hé"));
        assert_eq!(dom.text(tail), Some("llo"));
        assert_eq!(dom.next_sibling(text), Some(tail));
    }

    #[test]
    fn inserting_an_ancestor_into_its_descendant_is_ignored() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let outer = dom.create_element(realm, "div");
        let inner = dom.create_element(realm, "p");
        dom.append_child(doc, outer);
        dom.append_child(outer, inner);

        dom.append_child(inner, outer);
        assert_eq!(dom.parent(outer), Some(doc));
        assert_eq!(dom.parent(inner), Some(outer));
    }
}
