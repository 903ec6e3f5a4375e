mod commands;
mod config;
mod editor;
mod error;
mod observer;
mod plugin;

pub use crate::commands::{BLOCK_FORMATS, BUILTIN_PLUGINS};
pub use crate::config::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::observer::*;
pub use crate::plugin::*;
