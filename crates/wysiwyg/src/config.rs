use std::collections::BTreeMap;

use manos_dom_core::StyleOptions;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Option keys whose values are merged key by key instead of replaced.
const DEEP_MERGED: &[&str] = &["controls", "cleanup"];

const ENTER_MODES: &[&str] = &["p", "div", "br"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    pub remove_empty: bool,
    pub unwrap_duplicates: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            remove_empty: true,
            unwrap_duplicates: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Block tag created when inline content needs a block of its own.
    pub enter: String,
    pub read_only: bool,
    pub plugins: Vec<String>,
    /// Per-command overrides of the style a command applies.
    pub controls: BTreeMap<String, StyleOptions>,
    pub cleanup: CleanupOptions,
    /// Pattern of tag names that keep an element from counting as empty.
    pub empty_exceptions: Option<String>,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        self.enter = self.enter.trim().to_ascii_lowercase();
        if self.enter.is_empty() {
            self.enter = "p".to_string();
        }
        if self.plugins.is_empty() {
            self.plugins = crate::commands::BUILTIN_PLUGINS
                .iter()
                .map(|name| name.to_string())
                .collect();
        }
        self
    }

    /// Overlays `user` on top of this configuration.
    pub fn merge(&self, user: Value) -> Result<Self, ConfigError> {
        let Value::Object(user) = user else {
            return Err(ConfigError::NotAnObject);
        };
        let mut merged = serde_json::to_value(self)?;
        if let Value::Object(base) = &mut merged {
            for (key, value) in user {
                match (base.get_mut(&key), value) {
                    (Some(Value::Object(current)), Value::Object(overlay))
                        if DEEP_MERGED.contains(&key.as_str()) =>
                    {
                        deep_merge(current, overlay);
                    }
                    (_, value) => {
                        base.insert(key, value);
                    }
                }
            }
        }
        let config: Self = serde_json::from_value(merged)?;
        Ok(config.with_defaults())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ENTER_MODES.contains(&self.enter.as_str()) {
            return Err(ConfigError::UnsupportedEnter(self.enter.clone()));
        }
        self.exceptions()?;
        Ok(())
    }

    pub fn exceptions(&self) -> Result<Option<Regex>, ConfigError> {
        Ok(self
            .empty_exceptions
            .as_deref()
            .map(Regex::new)
            .transpose()?)
    }
}

fn deep_merge(base: &mut serde_json::Map<String, Value>, overlay: serde_json::Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(current)), Value::Object(nested)) => deep_merge(current, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_enter_and_plugins() {
        let config = EditorConfig::default().with_defaults();
        assert_eq!(config.enter, "p");
        assert!(config.plugins.iter().any(|p| p == "formatting"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_object_options_are_rejected() {
        let base = EditorConfig::default().with_defaults();
        assert!(matches!(
            base.merge(serde_json::json!([1, 2])),
            Err(ConfigError::NotAnObject)
        ));
    }
}
