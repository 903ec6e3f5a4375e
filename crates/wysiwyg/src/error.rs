use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("options must be a JSON object")]
    NotAnObject,
    #[error("invalid options: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("unsupported enter mode `{0}`")]
    UnsupportedEnter(String),
    #[error("invalid empty-element exceptions: {0}")]
    Exceptions(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("plugin `{0}` is already registered")]
    DuplicatePlugin(String),
    #[error("unknown plugin `{0}`")]
    UnknownPlugin(String),
    #[error("command `{command}` from plugin `{plugin}` is already defined")]
    DuplicateCommand { plugin: String, command: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("command `{command}` needs a `{field}` argument")]
    MissingArgument {
        command: String,
        field: &'static str,
    },
    #[error("command `{command}` got an invalid argument: {reason}")]
    InvalidArgument { command: String, reason: String },
}

impl CommandError {
    pub fn missing(command: &str, field: &'static str) -> Self {
        Self::MissingArgument {
            command: command.to_string(),
            field,
        }
    }

    pub fn invalid(command: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("host node is not an element")]
    HostNotElement,
    #[error("host element is not attached to a parent")]
    HostDetached,
    #[error("editor is read-only")]
    ReadOnly,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Command(#[from] CommandError),
}
