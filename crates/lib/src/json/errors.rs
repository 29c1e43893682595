//! Error types for the JSON codec.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum JsonError {
    /// Input text is not valid JSON
    #[error("Invalid JSON: {reason}")]
    Parse { reason: String },

    /// Import needs an object or an array at the top level
    #[error("Expected a JSON object or array, found {found}")]
    NotAContainer { found: String },

    /// A value with no JSON (or no tree) representation
    #[error("Unsupported value: {reason}")]
    UnsupportedValue { reason: String },

    /// Nesting deeper than the codec accepts
    #[error("Nesting exceeds {depth} levels")]
    DepthExceeded { depth: usize },
}

impl JsonError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, JsonError::Parse { .. } | JsonError::NotAContainer { .. })
    }

    pub fn is_unsupported_value(&self) -> bool {
        matches!(self, JsonError::UnsupportedValue { .. })
    }

    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, JsonError::DepthExceeded { .. })
    }
}

impl From<JsonError> for crate::Error {
    fn from(err: JsonError) -> Self {
        crate::Error::Json(err)
    }
}
