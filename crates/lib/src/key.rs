//! Keys addressing a slot inside a node.
//!
//! A [`Key`] is either an index (arrays, or positional access into a map), a
//! name (maps), or empty. Empty means "let the operation choose": append on
//! arrays, the value's own node name on maps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{IDX_END, IDX_LAST};

/// Node-level key.
///
/// Ordering is derived: `Empty < Index(_) < Name(_)`, indices numerically and
/// names lexically.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    #[default]
    Empty,
    Index(usize),
    Name(String),
}

impl Key {
    /// Shorthand for the append sentinel.
    pub const fn end() -> Self {
        Key::Index(IDX_END)
    }

    /// Shorthand for the "final element" sentinel.
    pub const fn last() -> Self {
        Key::Index(IDX_LAST)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Key::Empty)
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Key::Name(_))
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(idx) => Some(*idx),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            _ => None,
        }
    }

    /// True when both keys carry the same variant.
    pub fn same_kind(&self, other: &Key) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Key::Empty => "empty",
            Key::Index(_) => "index",
            Key::Name(_) => "name",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Empty => Ok(()),
            Key::Index(IDX_END) => write!(f, "[end]"),
            Key::Index(IDX_LAST) => write!(f, "[last]"),
            Key::Index(idx) => write!(f, "[{idx}]"),
            Key::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for Key {
    fn from(idx: usize) -> Self {
        Key::Index(idx)
    }
}

impl From<u32> for Key {
    fn from(idx: u32) -> Self {
        Key::Index(idx as usize)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.as_name() == Some(other)
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<usize> for Key {
    fn eq(&self, other: &usize) -> bool {
        self.as_index() == Some(*other)
    }
}
