//! Inline `style` attribute access and the small slice of computed-style
//! resolution the editor needs (tag defaults plus inheritance).

use crate::classify::BLOCK_TAGS;
use crate::dom::{Dom, NodeId};

const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "text-align",
    "visibility",
    "white-space",
];

/// `fontWeight` → `font-weight`; already kebab-cased names pass through.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.trim().chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name, value.to_string()))
        })
        .collect()
}

pub fn serialize_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn inline_css(dom: &Dom, node: NodeId, property: &str) -> Option<String> {
    let property = kebab_case(property);
    let style = dom.attr(node, "style")?;
    parse_style(style)
        .into_iter()
        .rev()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| value)
}

/// Sets (`Some`) or clears (`None`) one inline property. The `style`
/// attribute is dropped once it carries no declaration.
pub fn set_css(dom: &mut Dom, node: NodeId, property: &str, value: Option<&str>) {
    if dom.element(node).is_none() {
        return;
    }
    let property = kebab_case(property);
    let mut decls = dom.attr(node, "style").map(parse_style).unwrap_or_default();
    decls.retain(|(name, _)| *name != property);
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        decls.push((property, value.to_string()));
    }

    if decls.is_empty() {
        dom.remove_attr(node, "style");
    } else {
        dom.set_attr(node, "style", serialize_style(&decls));
    }
}

fn tag_default(tag: &str, property: &str) -> Option<&'static str> {
    match (property, tag) {
        ("font-weight", "b" | "strong" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th") => {
            Some("700")
        }
        ("font-style", "i" | "em" | "cite" | "var" | "dfn") => Some("italic"),
        ("text-decoration", "u" | "ins") => Some("underline"),
        ("text-decoration", "s" | "strike" | "del") => Some("line-through"),
        ("vertical-align", "sub") => Some("sub"),
        ("vertical-align", "sup") => Some("super"),
        ("font-family", "code" | "pre" | "kbd" | "samp") => Some("monospace"),
        _ => None,
    }
}

/// Resolves a property the way a browser would for our purposes: the inline
/// declaration, then the tag's user-agent default, then the parent's value for
/// inherited properties.
pub fn computed_css(dom: &Dom, node: NodeId, property: &str) -> Option<String> {
    let property = kebab_case(property);
    let mut current = Some(node);
    while let Some(n) = current {
        if let Some(tag) = dom.tag(n) {
            if let Some(value) = inline_css(dom, n, &property) {
                return Some(value);
            }
            if let Some(value) = tag_default(tag, &property) {
                return Some(value.to_string());
            }
            if !INHERITED.contains(&property.as_str()) {
                return None;
            }
        }
        current = dom.parent(n);
    }
    None
}

pub fn computed_display(dom: &Dom, node: NodeId) -> String {
    let Some(tag) = dom.tag(node) else {
        return "inline".to_string();
    };
    if let Some(display) = inline_css(dom, node, "display") {
        return display.to_ascii_lowercase();
    }
    match tag {
        "li" => "list-item",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        "thead" | "tbody" | "tfoot" => "table-row-group",
        "img" | "input" | "button" | "select" | "textarea" | "svg" | "canvas" => "inline-block",
        "br" | "hr" => "block",
        tag if BLOCK_TAGS.contains(&tag) => "block",
        _ => "inline",
    }
    .to_string()
}

/// Canonical spelling of a CSS value so that `bold`/`700`,
/// `rgb(255, 0, 0)`/`#FF0000` and `#f00`/`#ff0000` compare equal.
pub fn normalize_css_value(property: &str, value: &str) -> String {
    let property = kebab_case(property);
    let value = value
        .trim()
        .trim_end_matches("!important")
        .trim()
        .to_ascii_lowercase();
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");

    match property.as_str() {
        "font-weight" => match value.as_str() {
            "bold" => "700".to_string(),
            "normal" => "400".to_string(),
            _ => value,
        },
        "font-family" => value.replace(['"', '\''], ""),
        p if p.ends_with("color") => normalize_color(&value),
        _ => value,
    }
}

fn normalize_color(value: &str) -> String {
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 3 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return hex.chars().fold(String::from("#"), |mut acc, c| {
                acc.push(c);
                acc.push(c);
                acc
            });
        }
        return value.to_string();
    }

    let Some(inner) = value
        .strip_prefix("rgb(")
        .or_else(|| value.strip_prefix("rgba("))
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return value.to_string();
    };
    let parts: Vec<u8> = inner
        .split(',')
        .take(3)
        .filter_map(|p| p.trim().parse::<u8>().ok())
        .collect();
    if parts.len() != 3 {
        return value.to_string();
    }
    format!("#{:02x}{:02x}{:02x}", parts[0], parts[1], parts[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_equivalent_values() {
        assert_eq!(normalize_css_value("fontWeight", "bold"), "700");
        assert_eq!(normalize_css_value("color", "RGB(255, 0, 0)"), "#ff0000");
        assert_eq!(normalize_css_value("color", "#F00"), "#ff0000");
        assert_eq!(
            normalize_css_value("font-family", "\"Arial\",  serif"),
            "arial, serif"
        );
    }

    #[test]
    fn set_css_drops_empty_style_attribute() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let span = dom.create_element(realm, "span");
        set_css(&mut dom, span, "fontSize", Some("12px"));
        set_css(&mut dom, span, "color", Some("red"));
        assert_eq!(dom.attr(span, "style"), Some("font-size: 12px; color: red;"));

        set_css(&mut dom, span, "font-size", None);
        set_css(&mut dom, span, "color", None);
        assert_eq!(dom.attr(span, "style"), None);
    }

    #[test]
    fn computed_value_inherits_through_ancestors() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let realm = dom.realm(doc);
        let p = dom.create_element(realm, "p");
        let strong = dom.create_element(realm, "strong");
        let text = dom.create_text(realm, "x");
        dom.append_child(doc, p);
        dom.append_child(p, strong);
        dom.append_child(strong, text);
        dom.set_attr(p, "style", "color: blue");

        assert_eq!(computed_css(&dom, text, "color").as_deref(), Some("blue"));
        assert_eq!(computed_css(&dom, text, "font-weight").as_deref(), Some("700"));
        assert_eq!(computed_css(&dom, p, "text-decoration"), None);
    }
}
