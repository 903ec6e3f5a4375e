//! Builtin plugins and the commands they contribute.

use std::cmp::Ordering;

use manos_dom_core::mutate::{self, NodeFactory};
use manos_dom_core::{
    Boundary, Dom, NodeId, Range, SelectionManager, Style, StyleOptions, compare_boundaries,
    is_block, is_empty, is_marker, is_selection_marker, preserve_selection, set_css, walk,
};
use serde_json::Value;

use crate::editor::Editor;
use crate::error::{CommandError, RegistryError};
use crate::plugin::{CommandSpec, Plugin, PluginRegistry};

/// Plugins an editor loads when its configuration names none.
pub const BUILTIN_PLUGINS: &[&str] = &[
    "formatting",
    "color",
    "font",
    "format_block",
    "justify",
    "clean_html",
];

/// Empty by nature; never dropped as empty wrappers.
const KEEP_EMPTY: &[&str] = &["br", "wbr"];

pub const BLOCK_FORMATS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre"];

pub(crate) fn register_builtin(registry: &mut PluginRegistry) -> Result<(), RegistryError> {
    registry.register("formatting", || Box::new(FormattingPlugin))?;
    registry.register("color", || Box::new(ColorPlugin))?;
    registry.register("font", || Box::new(FontPlugin))?;
    registry.register("format_block", || Box::new(FormatBlockPlugin))?;
    registry.register("justify", || Box::new(JustifyPlugin))?;
    registry.register("clean_html", || Box::new(CleanHtmlPlugin))?;
    Ok(())
}

/// A command that toggles one fixed style, subject to `controls` overrides.
fn style_command(id: &'static str, label: &'static str, defaults: StyleOptions) -> CommandSpec {
    let options = defaults.clone();
    CommandSpec::new(id, label, move |editor, _args| {
        let style = Style::new(editor.style_for(id, &options));
        editor.apply_style(&style);
        Ok(())
    })
    .style(defaults)
}

/// A command that applies one CSS property whose value comes from `field`.
fn css_command(
    id: &'static str,
    label: &'static str,
    property: &'static str,
    field: &'static str,
    parse: fn(&str, &Value) -> Result<String, CommandError>,
) -> CommandSpec {
    CommandSpec::new(id, label, move |editor, args| {
        let raw = args
            .as_ref()
            .and_then(|args| args.get(field))
            .ok_or_else(|| CommandError::missing(id, field))?;
        let value = parse(id, raw)?;
        let style = Style::new(editor.style_for(id, &StyleOptions::css(property, value)));
        editor.apply_style(&style);
        Ok(())
    })
}

fn string_value(command: &str, raw: &Value) -> Result<String, CommandError> {
    raw.as_str()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CommandError::invalid(command, format!("expected a non-empty string, got {raw}")))
}

/// Bare numbers are pixel sizes.
fn size_value(command: &str, raw: &Value) -> Result<String, CommandError> {
    match raw {
        Value::Number(size) => match size.as_f64() {
            Some(px) if px > 0.0 => Ok(format!("{size}px")),
            _ => Err(CommandError::invalid(command, format!("size must be positive, got {size}"))),
        },
        Value::String(size) if size.trim().parse::<f64>().is_ok_and(|px| px > 0.0) => {
            Ok(format!("{}px", size.trim()))
        }
        raw => string_value(command, raw),
    }
}

struct FormattingPlugin;

impl Plugin for FormattingPlugin {
    fn name(&self) -> &'static str {
        "formatting"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            style_command("bold", "Bold", StyleOptions::element("strong"))
                .description("Toggle bold on the selection or caret."),
            style_command("italic", "Italic", StyleOptions::element("em"))
                .description("Toggle italic on the selection or caret."),
            style_command("underline", "Underline", StyleOptions::element("u"))
                .description("Toggle underline on the selection or caret."),
            style_command("strikethrough", "Strike through", StyleOptions::element("s"))
                .description("Toggle strikethrough on the selection or caret."),
            style_command("subscript", "Subscript", StyleOptions::element("sub")),
            style_command("superscript", "Superscript", StyleOptions::element("sup")),
        ]
    }
}

struct ColorPlugin;

impl Plugin for ColorPlugin {
    fn name(&self) -> &'static str {
        "color"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            css_command("fore_color", "Text color", "color", "color", string_value)
                .description("Toggle a text color on the selection.")
                .args_example(serde_json::json!({ "color": "#ff0000" })),
            css_command(
                "back_color",
                "Background color",
                "background-color",
                "color",
                string_value,
            )
            .description("Toggle a background color on the selection.")
            .args_example(serde_json::json!({ "color": "#fff59d" })),
        ]
    }
}

struct FontPlugin;

impl Plugin for FontPlugin {
    fn name(&self) -> &'static str {
        "font"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            css_command("font_size", "Font size", "font-size", "size", size_value)
                .description("Toggle a font size; numbers are pixels.")
                .args_example(serde_json::json!({ "size": 18 })),
            css_command(
                "font_family",
                "Font family",
                "font-family",
                "family",
                string_value,
            )
            .args_example(serde_json::json!({ "family": "Georgia, serif" })),
        ]
    }
}

struct FormatBlockPlugin;

impl Plugin for FormatBlockPlugin {
    fn name(&self) -> &'static str {
        "format_block"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("format_block", "Block format", |editor, args| {
                let tag = args
                    .as_ref()
                    .and_then(|args| args.get("tag"))
                    .ok_or_else(|| CommandError::missing("format_block", "tag"))
                    .and_then(|raw| string_value("format_block", raw))?
                    .to_ascii_lowercase();
                if !BLOCK_FORMATS.contains(&tag.as_str()) {
                    return Err(CommandError::invalid(
                        "format_block",
                        format!("unsupported block `{tag}`"),
                    ));
                }
                let style = Style::new(editor.style_for("format_block", &StyleOptions::element(tag)));
                format_block(editor, &style);
                Ok(())
            })
            .description("Turn the blocks touched by the selection into the given block.")
            .args_example(serde_json::json!({ "tag": "h1" })),
        ]
    }
}

/// Applies a block style to whole blocks: the selection is widened to the
/// blocks it touches for the style pass and put back afterwards.
fn format_block(editor: &mut Editor, style: &Style) {
    let area = editor.area();
    let (dom, selection) = editor.parts_mut();
    let range = selection.create_range();
    let realm = dom.realm(area);
    let block_of = |node: NodeId| walk::up(&*dom, node, |dom, n| is_block(dom, n, realm), area);
    let first = block_of(range.start.node).unwrap_or(area);
    let last = block_of(range.end.node).unwrap_or(area);

    preserve_selection(dom, selection, |dom, selection| {
        selection.set_range(Some(Range {
            start: Boundary::start_of(first),
            end: Boundary::end_of(dom, last),
        }));
        style.apply(dom, selection);
    });
}

struct JustifyPlugin;

impl Plugin for JustifyPlugin {
    fn name(&self) -> &'static str {
        "justify"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        [
            ("justify_left", "Align left", "left"),
            ("justify_center", "Align center", "center"),
            ("justify_right", "Align right", "right"),
            ("justify_full", "Justify", "justify"),
        ]
        .into_iter()
        .map(|(id, label, align)| {
            CommandSpec::new(id, label, move |editor, _args| {
                justify(editor, align);
                Ok(())
            })
        })
        .collect()
    }
}

/// Sets `text-align` on every block the selection touches. Left is the
/// default alignment, so it clears the property instead. Inline content
/// sitting directly in the area first gets a block of its own.
fn justify(editor: &mut Editor, align: &str) {
    let area = editor.area();
    let enter = match editor.config().enter.as_str() {
        "br" => "div".to_string(),
        tag => tag.to_string(),
    };
    let (dom, selection) = editor.parts_mut();
    let factory = NodeFactory::for_node(dom, area);

    preserve_selection(dom, selection, |dom, selection| {
        let range = selection.create_range();
        let realm = dom.realm(area);
        let mut blocks: Vec<NodeId> = Vec::new();
        for node in touched_leaves(dom, area, range) {
            let block = match walk::up(dom, node, |dom, n| is_block(dom, n, realm), area) {
                Some(block) => block,
                None => match mutate::wrap_inline(dom, node, enter.as_str(), &factory, None) {
                    Some(block) => block,
                    None => continue,
                },
            };
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
        for block in blocks {
            let value = (align != "left").then_some(align);
            set_css(dom, block, "text-align", value);
        }
    });
}

/// Text nodes and childless elements the range intersects, or the node at
/// the caret when it is collapsed.
fn touched_leaves(dom: &Dom, area: NodeId, range: Range) -> Vec<NodeId> {
    if range.is_collapsed() {
        let node = dom
            .children(range.start.node)
            .get(range.start.offset)
            .copied()
            .unwrap_or(range.start.node);
        return if node == area { Vec::new() } else { vec![node] };
    }

    walk::query_all(dom, area, |dom, node| {
        node != area
            && dom.first_child(node).is_none()
            && !is_marker(dom, node)
            && compare_boundaries(dom, Boundary::end_of(dom, node), range.start) == Ordering::Greater
            && compare_boundaries(dom, Boundary::start_of(node), range.end) == Ordering::Less
    })
}

struct CleanHtmlPlugin;

impl Plugin for CleanHtmlPlugin {
    fn name(&self) -> &'static str {
        "clean_html"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("clean_html", "Clean HTML", |editor, _args| {
                let exceptions = editor
                    .config()
                    .exceptions()
                    .map_err(|err| CommandError::invalid("clean_html", err.to_string()))?;
                let cleanup = editor.config().cleanup.clone();
                let area = editor.area();
                let (dom, selection) = editor.parts_mut();

                preserve_selection(dom, selection, |dom, _| {
                    let realm = dom.realm(area);
                    let inline = |dom: &Dom, node: NodeId| {
                        node != area
                            && dom.element(node).is_some()
                            && !is_block(dom, node, realm)
                            && !is_marker(dom, node)
                    };
                    let mut candidates = walk::query_all(dom, area, inline);
                    // Innermost first, so emptied parents are seen as empty.
                    candidates.reverse();

                    let mut removed = 0usize;
                    let mut unwrapped = 0usize;
                    for node in candidates {
                        if dom.parent(node).is_none() {
                            continue;
                        }
                        if cleanup.remove_empty
                            && !holds_kept_empty(dom, node)
                            && is_empty(dom, node, exceptions.as_ref())
                            && !holds_caret(dom, node)
                        {
                            mutate::safe_remove(dom, node);
                            removed += 1;
                        } else if cleanup.unwrap_duplicates && duplicates_ancestor(dom, node, area) {
                            mutate::unwrap(dom, node);
                            unwrapped += 1;
                        }
                    }
                    let first = dom.first_child(area);
                    mutate::normalize_node(dom, first);
                    tracing::debug!(removed, unwrapped, "html cleaned");
                });
                Ok(())
            })
            .description("Drop empty inline wrappers and nested duplicate inline tags."),
        ]
    }
}

/// Whether `node` is, or wraps, an element that is empty by nature.
fn holds_kept_empty(dom: &Dom, node: NodeId) -> bool {
    !walk::query_all(dom, node, |dom, n| {
        dom.tag(n).is_some_and(|tag| KEEP_EMPTY.contains(&tag))
    })
    .is_empty()
}

fn holds_caret(dom: &Dom, node: NodeId) -> bool {
    !walk::query_all(dom, node, |dom, n| is_selection_marker(dom, n)).is_empty()
}

/// An attribute-less inline element nested inside another element with the
/// same tag, before reaching a block.
fn duplicates_ancestor(dom: &Dom, node: NodeId, area: NodeId) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };
    if !element.attrs.is_empty() {
        return false;
    }
    let realm = dom.realm(area);
    dom.ancestors(node)
        .take_while(|&ancestor| ancestor != area && !is_block(dom, ancestor, realm))
        .any(|ancestor| dom.tag(ancestor) == Some(element.tag.as_str()))
}
