//! Fus container constants.
//!
//! ```text
//! Preamble (8 bytes)
//!  [0..5]  Magic: b"FUSEE"
//!  [5]     Flags: u8 (reserved, 0)
//!  [6..8]  Container version: u16 LE
//! Header      format_version u32, generator, created_by, creation_date
//! Components  count u32, then { tag u8, name, payload_len u32, payload }
//! Node tree   count u32, then { name, refs, children } recursively
//! ```
//!
//! Strings are a u32 byte length followed by UTF-8; optional strings carry a
//! leading presence byte. All numbers are little-endian.

/// Magic bytes at the start of a fus document.
pub const FUS_MAGIC: &[u8; 5] = b"FUSEE";

/// Size of the fixed preamble in bytes.
pub const PREAMBLE_SIZE: usize = 8;

/// Offset of the flags byte in the preamble.
pub const FLAGS_OFFSET: usize = 5;

/// Offset of the container version in the preamble.
pub const VERSION_OFFSET: usize = 6;

/// Current container version.
pub const CONTAINER_VERSION: u16 = 1;

/// Scene file version stored in the document header.
pub const FILE_VERSION: u32 = 1;

/// Maximum number of vertices in one mesh chunk.
///
/// Triangle indices are `u16`; the limit is kept a multiple of three.
pub const MAX_VERTS_PER_CHUNK: usize = (65000 / 3) * 3;

/// Deepest node level (0 for top-level nodes) written or accepted by the decoder.
pub const MAX_NODE_DEPTH: usize = 4096;

/// Component tag: transform.
pub const TAG_TRANSFORM: u8 = 0;
/// Component tag: mesh.
pub const TAG_MESH: u8 = 1;
/// Component tag: material.
pub const TAG_MATERIAL: u8 = 2;
/// Component tag: camera.
pub const TAG_CAMERA: u8 = 3;
/// Component tag: light.
pub const TAG_LIGHT: u8 = 4;

/// Presence byte for optional values.
pub const PRESENT: u8 = 1;
/// Absence byte for optional values.
pub const ABSENT: u8 = 0;
