//! Error types for document access and mutation

use thiserror::Error;

use super::node::NodeId;

/// Errors produced by document lookups and mutation primitives.
///
/// Scanners never produce these (unclassifiable nodes are skipped);
/// mutating operations surface them per item so one bad node never
/// aborts a whole batch.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Referenced node id no longer resolves (deleted since it was
    /// captured). Non-fatal at the per-item level.
    #[error("node {id} no longer exists")]
    NotFound { id: NodeId },

    /// Operation requested on a node type or state that cannot support
    /// it.
    #[error("unsupported operation on {id}: {reason}")]
    Unsupported { id: NodeId, reason: String },

    /// Structural mutation attempted inside a protected
    /// component/instance subtree.
    #[error("node {id} is inside a protected subtree and cannot be restructured")]
    Protected { id: NodeId },

    /// A host-level primitive rejected its input.
    #[error("host primitive failed: {reason}")]
    Host { reason: String },

    /// Insufficient or malformed input, detected before any mutation.
    #[error("{reason}")]
    Validation { reason: String },
}

impl DocumentError {
    pub fn unsupported(id: NodeId, reason: impl Into<String>) -> Self {
        DocumentError::Unsupported {
            id,
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        DocumentError::Validation {
            reason: reason.into(),
        }
    }

    pub fn host(reason: impl Into<String>) -> Self {
        DocumentError::Host {
            reason: reason.into(),
        }
    }
}
