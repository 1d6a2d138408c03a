//! Scene document model.

mod component;
mod document;

pub use component::*;
pub use document::*;
