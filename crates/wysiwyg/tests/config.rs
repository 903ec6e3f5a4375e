use manos_dom_core::StyleOptions;
use manos_wysiwyg::{CleanupOptions, ConfigError, EditorConfig};
use pretty_assertions::assert_eq;
use serde_json::json;

fn defaults() -> EditorConfig {
    EditorConfig::default()
        .merge(json!({
            "controls": {
                "bold": { "element": "strong" },
                "fore_color": { "style": { "color": "red" } }
            }
        }))
        .unwrap()
}

#[test]
fn object_options_are_merged_key_by_key() {
    let merged = defaults()
        .merge(json!({
            "controls": { "italic": { "element": "i" } },
            "cleanup": { "remove_empty": false }
        }))
        .unwrap();

    assert_eq!(merged.controls.len(), 3);
    assert_eq!(merged.controls["bold"], StyleOptions::element("strong"));
    assert_eq!(merged.controls["italic"], StyleOptions::element("i"));
    assert_eq!(
        merged.cleanup,
        CleanupOptions {
            remove_empty: false,
            unwrap_duplicates: true,
        }
    );
}

#[test]
fn nested_control_fields_merge_too() {
    let merged = defaults()
        .merge(json!({ "controls": { "fore_color": { "defaultTag": "font" } } }))
        .unwrap();

    let control = &merged.controls["fore_color"];
    assert_eq!(control.default_tag.as_deref(), Some("font"));
    assert_eq!(
        control.style.as_ref().and_then(|s| s.get("color")).map(String::as_str),
        Some("red")
    );
}

#[test]
fn other_options_are_replaced_wholesale() {
    let base = defaults()
        .merge(json!({ "plugins": ["formatting", "color"] }))
        .unwrap();
    let merged = base.merge(json!({ "plugins": ["justify"], "enter": "DIV" })).unwrap();

    assert_eq!(merged.plugins, vec!["justify".to_string()]);
    assert_eq!(merged.enter, "div");
}

#[test]
fn invalid_options_are_rejected() {
    let base = defaults();

    assert!(matches!(
        base.merge(json!({ "read_only": "yes" })),
        Err(ConfigError::Invalid(_))
    ));

    let enter = base.merge(json!({ "enter": "section" })).unwrap();
    assert!(matches!(
        enter.validate(),
        Err(ConfigError::UnsupportedEnter(mode)) if mode == "section"
    ));

    let pattern = base.merge(json!({ "empty_exceptions": "^(img" })).unwrap();
    assert!(matches!(pattern.validate(), Err(ConfigError::Exceptions(_))));
}
