//! Error types for node operations.
//!
//! Expected outcomes (veto, occupied key, cycle, compare mismatch) are
//! reported through return values. These errors cover misuse and internal
//! inconsistencies that the caller should hear about.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum NodeError {
    /// A key that the target container cannot address
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Operation not supported by this node kind
    #[error("Operation requires a {expected} node, found {actual}")]
    KindMismatch { expected: String, actual: String },

    /// A multi-step update could not be completed after its first step
    #[error("Inconsistent node state: {reason}")]
    Inconsistent { reason: String },

    /// Parent chain longer than the walk guard allows
    #[error("Parent chain exceeds {depth} levels")]
    DepthExceeded { depth: usize },

    /// Nothing stored at the requested location
    #[error("Nothing found at '{path}'")]
    NotFound { path: String },
}

impl NodeError {
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, NodeError::InvalidKey { .. })
    }

    pub fn is_kind_mismatch(&self) -> bool {
        matches!(self, NodeError::KindMismatch { .. })
    }

    pub fn is_inconsistent(&self) -> bool {
        matches!(self, NodeError::Inconsistent { .. })
    }

    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, NodeError::DepthExceeded { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NodeError::NotFound { .. })
    }
}

impl From<NodeError> for crate::Error {
    fn from(err: NodeError) -> Self {
        crate::Error::Node(err)
    }
}
