//! HTML source in and out of the arena.
//!
//! Parsing goes through html5ever's fragment parser with a `body` context, so
//! the input is read the way a browser reads `innerHTML`. Serialization skips
//! selection markers and unwraps temporary fragment wrappers.

use std::cmp::Ordering;

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::classify::{FRAGMENT_ATTR, is_selection_marker};
use crate::dom::{Dom, NodeId, NodeKind, Realm, char_to_byte};
use crate::range::{Boundary, Range};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Parses `html` and appends the resulting nodes to `parent`. Returns the
/// appended top-level nodes.
pub fn parse_html_into(dom: &mut Dom, parent: NodeId, html: &str) -> Vec<NodeId> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let parsed = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(html);

    let realm = dom.realm(parent);
    let mut appended = Vec::new();
    // The fragment parser puts everything under a synthetic `html` element.
    let roots = parsed.document.children.borrow().clone();
    for root in roots {
        for child in root.children.borrow().iter() {
            if let Some(node) = import(dom, realm, child) {
                dom.append_child(parent, node);
                appended.push(node);
            }
        }
    }
    tracing::trace!(count = appended.len(), "parsed html");
    appended
}

fn import(dom: &mut Dom, realm: Realm, handle: &Handle) -> Option<NodeId> {
    let node = match &handle.data {
        NodeData::Text { contents } => {
            return Some(dom.create_text(realm, contents.borrow().to_string()));
        }
        NodeData::Comment { contents } => {
            return Some(dom.create_comment(realm, contents.to_string()));
        }
        NodeData::Element { name, attrs, .. } => {
            let element = dom.create_element(realm, &name.local);
            for attr in attrs.borrow().iter() {
                dom.set_attr(element, &attr.name.local, attr.value.to_string());
            }
            element
        }
        _ => return None,
    };

    for child in handle.children.borrow().iter() {
        if let Some(child) = import(dom, realm, child) {
            dom.append_child(node, child);
        }
    }
    Some(node)
}

pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    Serializer::new(dom, &[]).children(node, &mut out);
    out
}

pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    Serializer::new(dom, &[]).node(node, &mut out);
    out
}

/// `inner_html` with `[`, `]` (range ends) or `|` (caret) written at the
/// boundary points of `range`.
pub fn inner_html_with_range(dom: &Dom, node: NodeId, range: Option<Range>) -> String {
    let marks: Vec<(Boundary, char)> = match range {
        Some(range) if range.is_collapsed() => vec![(range.start, '|')],
        Some(range) => vec![(range.start, '['), (range.end, ']')],
        None => Vec::new(),
    };
    let mut out = String::new();
    Serializer::new(dom, &marks).children(node, &mut out);
    out
}

struct Serializer<'a> {
    dom: &'a Dom,
    marks: &'a [(Boundary, char)],
}

impl<'a> Serializer<'a> {
    fn new(dom: &'a Dom, marks: &'a [(Boundary, char)]) -> Self {
        Self { dom, marks }
    }

    fn marks_at(&self, node: NodeId, offset: usize, out: &mut String) {
        for (point, mark) in self.marks {
            if point.node == node && point.offset == offset {
                out.push(*mark);
            }
        }
    }

    fn children(&self, node: NodeId, out: &mut String) {
        let children = self.dom.children(node);
        for (ix, &child) in children.iter().enumerate() {
            self.marks_at(node, ix, out);
            self.node(child, out);
        }
        self.marks_at(node, children.len(), out);
    }

    fn node(&self, node: NodeId, out: &mut String) {
        match self.dom.kind(node) {
            NodeKind::Text(text) => self.text(node, text, out),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Document | NodeKind::Fragment => self.children(node, out),
            NodeKind::Element(el) => {
                if is_selection_marker(self.dom, node) {
                    return;
                }
                if el.attrs.contains_key(FRAGMENT_ATTR) {
                    self.children(node, out);
                    return;
                }

                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                self.children(node, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    fn text(&self, node: NodeId, text: &str, out: &mut String) {
        let raw = self
            .dom
            .parent(node)
            .and_then(|parent| self.dom.tag(parent))
            .is_some_and(|tag| RAW_TEXT_TAGS.contains(&tag));
        let escape = |segment: &str, out: &mut String| {
            if raw {
                out.push_str(segment);
            } else {
                out.push_str(&html_escape::encode_text(segment));
            }
        };

        let mut cuts: Vec<(usize, char)> = self
            .marks
            .iter()
            .filter(|(point, _)| point.node == node)
            .map(|(point, mark)| (point.offset, *mark))
            .collect();
        cuts.sort_by(|a, b| a.0.cmp(&b.0).then(mark_order(a.1, b.1)));

        let mut from = 0;
        for (offset, mark) in cuts {
            let to = char_to_byte(text, offset).max(from);
            escape(&text[from..to], out);
            out.push(mark);
            from = to;
        }
        escape(&text[from..], out);
    }
}

fn mark_order(a: char, b: char) -> Ordering {
    let rank = |c| match c {
        '[' => 0,
        '|' => 1,
        _ => 2,
    };
    rank(a).cmp(&rank(b))
}
