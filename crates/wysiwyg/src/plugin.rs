use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use manos_dom_core::StyleOptions;
use serde_json::Value;

use crate::editor::Editor;
use crate::error::{CommandError, RegistryError};

pub type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    /// The style the command toggles, when it has a fixed one. Used to report
    /// whether the command is active at the caret.
    pub style: Option<StyleOptions>,
    pub args_example: Option<Value>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            style: None,
            args_example: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn style(mut self, style: StyleOptions) -> Self {
        self.style = Some(style);
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
}

pub type PluginFactory = Arc<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Named plugin factories. An editor resolves the plugins listed in its
/// configuration against a registry when it is created.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtin(&mut registry)
            .expect("builtin plugin names must be unique");
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicatePlugin(name));
        }
        tracing::trace!(plugin = %name, "plugin registered");
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Box<dyn Plugin>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownPlugin(name.to_string()))?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates the named plugins and collects their commands by id.
    pub fn load(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, CommandSpec>, RegistryError> {
        let mut commands = HashMap::new();
        for name in names {
            let plugin = self.resolve(name)?;
            for command in plugin.commands() {
                if commands.contains_key(&command.id) {
                    return Err(RegistryError::DuplicateCommand {
                        plugin: plugin.name().to_string(),
                        command: command.id,
                    });
                }
                commands.insert(command.id.clone(), command);
            }
        }
        Ok(commands)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
