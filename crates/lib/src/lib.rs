//!
//! Arbor: an in-process, thread-safe tree of typed values.
//!
//! ## Core Concepts
//!
//! * **Values (`value::Value`)**: A tagged union over scalars, strings, null and node references.
//!   Owning references (`Value::Node`) make the holder the node's parent; aliases (`Value::Alias`)
//!   are read-only links that never affect ownership.
//! * **Timed values (`timed::TimedValue`)**: Every stored value carries the logical tick it was
//!   written at, taken from a process-wide clock that never repeats (`clock`).
//! * **Containers (`container::Container`)**: The slot storage behind a node: an array, a map,
//!   or a map that remembers erasures as tombstones.
//! * **Nodes (`node::Node`)**: A container plus a name, a weak parent pointer and change
//!   listeners. Listeners may veto any change; earlier listeners then see a rollback.
//! * **Paths (`path::Path`)**: Key sequences addressing nested slots, with a `a::b[3]` text form.
//! * **Tree operations (`ops`)**: Path walking, cloning, structural comparison, patching and
//!   parent-pointer repair, all built on the node API.
//! * **JSON (`json`)**: Import and export of whole trees.
//! * **XML (`xml`)**: The same for XML documents, with attributes and inner text kept as prefixed keys.

pub mod clock;
pub mod constants;
pub mod container;
pub mod json;
pub mod key;
pub mod node;
pub mod ops;
pub mod path;
pub mod timed;
pub mod value;
pub mod xml;

pub use container::{CopyAction, EachAction};
pub use key::Key;
pub use node::{InsertOutcome, Node, NodeKind, NodeRef, NodeView, Reason};
pub use path::Path;
pub use timed::TimedValue;
pub use value::{Value, ValueKind};

/// Result type used throughout the Arbor library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Arbor library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured node errors from the node module
    #[error(transparent)]
    Node(node::NodeError),

    /// Structured path syntax errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured codec errors from the json module
    #[error(transparent)]
    Json(json::JsonError),

    /// Structured codec errors from the xml module
    #[error(transparent)]
    Xml(xml::XmlError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Node(_) => "node",
            Error::Path(_) => "path",
            Error::Json(_) => "json",
            Error::Xml(_) => "xml",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates nothing was stored at the requested location.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a key the target node cannot address.
    pub fn is_invalid_key(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_invalid_key(),
            _ => false,
        }
    }

    /// Check if this error came from parsing text (paths, JSON or XML).
    pub fn is_parse_error(&self) -> bool {
        match self {
            Error::Path(_) => true,
            Error::Json(json_err) => json_err.is_parse_error(),
            Error::Xml(xml_err) => xml_err.is_parse_error(),
            Error::Serialize(_) => true,
            _ => false,
        }
    }

    /// Check if this error indicates an operation was left half-done.
    pub fn is_inconsistent(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_inconsistent(),
            _ => false,
        }
    }
}
