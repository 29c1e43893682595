//! Error types for the XML codec.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum XmlError {
    /// Input text is not well-formed XML
    #[error("Invalid XML at byte {position}: {reason}")]
    Parse { position: u64, reason: String },

    /// Well-formed fragments that do not make a single document
    #[error("Malformed XML document: {reason}")]
    Structure { reason: String },

    /// The writer failed to produce the document
    #[error("XML write failed: {reason}")]
    Write { reason: String },

    /// Nesting deeper than the codec accepts
    #[error("Nesting exceeds {depth} levels")]
    DepthExceeded { depth: usize },
}

impl XmlError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, XmlError::Parse { .. } | XmlError::Structure { .. })
    }

    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, XmlError::DepthExceeded { .. })
    }
}

impl From<XmlError> for crate::Error {
    fn from(err: XmlError) -> Self {
        crate::Error::Xml(err)
    }
}
