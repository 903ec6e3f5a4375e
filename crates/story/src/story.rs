use anyhow::{Context, Result};
use manos_wysiwyg::{Editor, EditorConfig, PluginRegistry, textarea_page};
use serde_json::Value;

pub struct Outcome {
    pub marked: String,
    pub value: String,
}

fn editor(config: EditorConfig) -> Result<Editor> {
    let (dom, host) = textarea_page("");
    Editor::new(dom, host, config, &PluginRegistry::builtin()).context("failed to create the editor")
}

pub fn run(config: EditorConfig, command: &str, marked: &str, args: Option<Value>) -> Result<Outcome> {
    let mut editor = editor(config)?;
    editor.set_marked(marked);
    editor
        .run_command(command, args)
        .with_context(|| format!("`{command}` failed"))?;

    Ok(Outcome {
        marked: editor.marked(),
        value: editor.value(),
    })
}

/// Command ids with their labels, sorted by id.
pub fn list(config: EditorConfig) -> Result<Vec<(String, String)>> {
    let editor = editor(config)?;
    let mut commands: Vec<(String, String)> = editor
        .commands()
        .map(|command| (command.id.clone(), command.label.clone()))
        .collect();
    commands.sort();
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EditorConfig {
        EditorConfig::default().with_defaults()
    }

    #[test]
    fn runs_a_command_over_marked_html() {
        let outcome = run(config(), "bold", "<p>Tex[t to te]xt</p>", None).unwrap();
        assert_eq!(outcome.marked, "<p>Tex[<strong>t to te</strong>]xt</p>");
        assert_eq!(outcome.value, "<p>Tex<strong>t to te</strong>xt</p>");
    }

    #[test]
    fn failing_command_names_itself() {
        let err = run(config(), "fore_color", "<p>[a]</p>", None).err().unwrap();
        assert!(err.to_string().contains("fore_color"));
    }

    #[test]
    fn lists_builtin_commands() {
        let ids: Vec<String> = list(config()).unwrap().into_iter().map(|(id, _)| id).collect();
        assert!(ids.contains(&"format_block".to_string()));
        assert!(ids.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
