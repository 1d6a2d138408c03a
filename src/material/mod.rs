//! Materials: flat channel records and extraction from shader node graphs.

mod channels;
mod extract;
mod graph;

pub use channels::*;
pub use extract::*;
pub use graph::*;

/// Name under which the fallback material is cached.
pub const DEFAULT_MATERIAL_NAME: &str = "FUSEE_Default_Material";
