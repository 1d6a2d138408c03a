//! Error types for the fus scene library.

use thiserror::Error;

use crate::scene::ComponentKind;

/// Main error type for building, encoding and decoding scene documents.
#[derive(Error, Debug)]
pub enum Error {
    /// A component was attached while no node is open at the current depth
    #[error("No current node: call add_child() before attaching components")]
    NoCurrentNode,

    /// `pop()` without a matching `push()`, or an unbalanced cursor stack at serialize time
    #[error("Unbalanced node stack (depth {depth})")]
    UnbalancedStack { depth: usize },

    /// `push()` would nest nodes deeper than the decoder accepts
    #[error("Node nesting exceeds maximum depth {max}")]
    NestingTooDeep { max: usize },

    /// A streaming component was begun while another one is still open
    #[error("Cannot begin {requested:?} while {open:?} component is still open")]
    OpenComponent {
        open: ComponentKind,
        requested: ComponentKind,
    },

    /// The document was finalized while a streaming component was still open
    #[error("{0:?} component was not ended before finalizing")]
    UnfinishedComponent(ComponentKind),

    /// A channel/vertex operation was issued without the matching begin call
    #[error("No open {0:?} component")]
    NoOpenComponent(ComponentKind),

    /// Two different vertices resolved to the same dedup key
    #[error("Vertex {index} dedup key conflict: stored {stored:?}, new {incoming:?}")]
    DuplicateKeyConflict {
        index: u16,
        stored: [f32; 3],
        incoming: [f32; 3],
    },

    /// A mesh chunk cannot be started without a vertex
    #[error("Mesh has no vertices")]
    EmptyMesh,

    /// Invalid magic bytes at start of document
    #[error("Invalid fus document: expected FUSEE magic bytes")]
    InvalidMagic,

    /// Unsupported container version
    #[error("Unsupported fus container version: {0}")]
    UnsupportedVersion(u16),

    /// Document is truncated
    #[error("Unexpected end of document at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in document
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Unknown component tag
    #[error("Unknown component tag {tag} at position {pos}")]
    UnknownComponentTag { tag: u8, pos: u64 },

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for fus operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::OpenComponent {
            open: ComponentKind::Material,
            requested: ComponentKind::Mesh,
        };
        assert!(e.to_string().contains("Material"));
        assert!(e.to_string().contains("Mesh"));

        let e = Error::UnbalancedStack { depth: 0 };
        assert!(e.to_string().contains("0"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
