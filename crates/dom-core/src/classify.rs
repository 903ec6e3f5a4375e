use std::sync::LazyLock;

use regex::Regex;

use crate::css::{computed_display, inline_css};
use crate::dom::{Dom, NodeId, NodeKind, Realm};

pub const INVISIBLE_SPACE: char = '\u{FEFF}';

/// Marks the invisible elements that carry a saved selection.
pub const SELECTION_MARKER_ATTR: &str = "data-manos-selection-marker";

/// Marks temporary wrappers around selection fragments and caret anchors.
pub const FRAGMENT_ATTR: &str = "data-manos-fragment";

pub const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "caption",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "html",
    "iframe",
    "li",
    "main",
    "nav",
    "object",
    "ol",
    "p",
    "pre",
    "script",
    "section",
    "style",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

const UNSPLITTABLE_BLOCKS: &[&str] = &["td", "th", "caption", "form"];

pub static DEFAULT_EMPTY_EXCEPTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(img|svg|canvas|input|textarea|form)$").expect("valid regex"));

pub fn is_text(dom: &Dom, node: NodeId) -> bool {
    matches!(dom.kind(node), NodeKind::Text(_))
}

pub fn is_comment(dom: &Dom, node: NodeId) -> bool {
    matches!(dom.kind(node), NodeKind::Comment(_))
}

pub fn is_fragment(dom: &Dom, node: NodeId) -> bool {
    matches!(dom.kind(node), NodeKind::Fragment)
}

pub fn is_element(dom: &Dom, node: NodeId, realm: Realm) -> bool {
    dom.element(node).is_some() && dom.realm(node) == realm
}

pub fn is_tag(dom: &Dom, node: NodeId, tags: &[&str]) -> bool {
    dom.tag(node).is_some_and(|tag| tags.contains(&tag))
}

pub fn is_block(dom: &Dom, node: NodeId, realm: Realm) -> bool {
    is_element(dom, node, realm) && is_tag(dom, node, BLOCK_TAGS)
}

pub fn is_inline_block(dom: &Dom, node: NodeId) -> bool {
    if dom.element(node).is_none() || is_tag(dom, node, &["br", "hr"]) {
        return false;
    }
    matches!(computed_display(dom, node).as_str(), "inline" | "inline-block")
}

pub fn can_split_block(dom: &Dom, node: NodeId, realm: Realm) -> bool {
    is_block(dom, node, realm)
        && !is_tag(dom, node, UNSPLITTABLE_BLOCKS)
        && !matches!(
            inline_css(dom, node, "position").as_deref(),
            Some("absolute" | "fixed")
        )
}

pub fn is_cell(dom: &Dom, node: NodeId, realm: Realm) -> bool {
    is_element(dom, node, realm) && is_tag(dom, node, &["td", "th"])
}

pub fn is_image(dom: &Dom, node: NodeId, realm: Realm) -> bool {
    is_element(dom, node, realm) && is_tag(dom, node, &["img"])
}

pub fn is_empty_text_node(dom: &Dom, node: NodeId) -> bool {
    dom.text(node)
        .is_some_and(|text| text.chars().all(|c| c == INVISIBLE_SPACE))
}

pub fn is_selection_marker(dom: &Dom, node: NodeId) -> bool {
    dom.has_attr(node, SELECTION_MARKER_ATTR)
}

pub fn is_marker(dom: &Dom, node: NodeId) -> bool {
    is_selection_marker(dom, node) || dom.has_attr(node, FRAGMENT_ATTR)
}

/// A node that counts as content: neither an empty text artifact nor an
/// editor marker.
pub fn is_normal_node(dom: &Dom, node: NodeId) -> bool {
    !is_empty_text_node(dom, node) && !is_marker(dom, node)
}

/// `None` uses [`DEFAULT_EMPTY_EXCEPTIONS`].
pub fn is_empty(dom: &Dom, node: NodeId, exceptions: Option<&Regex>) -> bool {
    let exceptions = exceptions.unwrap_or(&*DEFAULT_EMPTY_EXCEPTIONS);
    match dom.kind(node) {
        NodeKind::Text(text) => text
            .chars()
            .all(|c| c.is_whitespace() || c == INVISIBLE_SPACE),
        NodeKind::Comment(_) => true,
        NodeKind::Element(el) if exceptions.is_match(&el.tag) => false,
        _ => !has_content(dom, node, exceptions),
    }
}

fn has_content(dom: &Dom, node: NodeId, exceptions: &Regex) -> bool {
    dom.children(node).iter().any(|&child| match dom.kind(child) {
        NodeKind::Text(text) => text
            .chars()
            .any(|c| !c.is_whitespace() && c != INVISIBLE_SPACE),
        NodeKind::Element(el) => exceptions.is_match(&el.tag) || has_content(dom, child, exceptions),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_check_respects_realm() {
        let mut dom = Dom::new();
        let host = dom.create_document();
        let frame = dom.create_document();
        let host_realm = dom.realm(host);
        let frame_realm = dom.realm(frame);
        let p = dom.create_element(frame_realm, "p");

        assert!(is_block(&dom, p, frame_realm));
        assert!(!is_block(&dom, p, host_realm));
    }

    #[test]
    fn positioned_blocks_cannot_be_split() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let div = dom.create_element(realm, "div");
        let td = dom.create_element(realm, "td");
        assert!(can_split_block(&dom, div, realm));
        assert!(!can_split_block(&dom, td, realm));

        dom.set_attr(div, "style", "position: absolute");
        assert!(!can_split_block(&dom, div, realm));
    }

    #[test]
    fn inline_block_uses_display() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let span = dom.create_element(realm, "span");
        let br = dom.create_element(realm, "br");
        let img = dom.create_element(realm, "img");
        let p = dom.create_element(realm, "p");
        assert!(is_inline_block(&dom, span));
        assert!(is_inline_block(&dom, img));
        assert!(!is_inline_block(&dom, br));
        assert!(!is_inline_block(&dom, p));

        dom.set_attr(p, "style", "display: inline-block");
        assert!(is_inline_block(&dom, p));
    }
}
