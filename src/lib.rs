//! # fus
//!
//! Writer and reader for the FUSEE (`.fus`) binary scene format.
//!
//! A scene is a tree of named nodes referencing entries of one flat component
//! table (transforms, mesh chunks, materials, cameras, lights). Meshes are
//! split into chunks addressable with 16-bit indices, and identically named
//! meshes and materials are stored once and referenced by index.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types, bounding boxes
//! - [`format`] - Container constants
//! - [`scene`] - Document model (header, components, nodes)
//! - [`material`] - Material channels and shader graph extraction
//! - [`xform`] - Source to target transform resolution
//! - [`writer`] - Streaming document builder and encoder
//! - [`reader`] - Document decoder
//! - [`export`] - Traversal driver over a source object graph
//!
//! ## Example
//!
//! ```ignore
//! use fus::prelude::*;
//!
//! let mut w = SceneWriter::new(Header::new("my-tool", "me"));
//! w.add_child(Some("Root"));
//! w.add_transform(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::ONE)?;
//! let bytes = w.serialize()?;
//! let doc = fus::reader::read_document(&bytes)?;
//! ```

pub mod util;
pub mod format;
pub mod scene;
pub mod material;
pub mod xform;
pub mod writer;
pub mod reader;
pub mod export;

// Re-export commonly used types
pub use util::{Error, Result};
pub use scene::SceneDocument;
pub use writer::SceneWriter;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Vec2, Vec3, Vec4, DMat4, BBox3f};
    pub use crate::scene::*;
    pub use crate::material::{ColorChannel, Material, NormalMapChannel, PbrSettings, SpecularChannel};
    pub use crate::writer::{SceneWriter, VertexRecord};
    pub use crate::reader::{read_document, read_document_file};
    pub use crate::export::{ExportSettings, SceneExporter, SourceNode, SourceObject};
}
