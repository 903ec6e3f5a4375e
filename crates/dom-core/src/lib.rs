mod classify;
mod css;
mod dom;
mod html;
mod markup;
pub mod mutate;
mod range;
mod selection;
mod style;
pub mod walk;

pub use crate::classify::*;
pub use crate::css::*;
pub use crate::dom::*;
pub use crate::html::*;
pub use crate::markup::*;
pub use crate::mutate::{ElementFactory, NewElement, NodeFactory, ReplaceOptions};
pub use crate::range::*;
pub use crate::selection::*;
pub use crate::style::*;
