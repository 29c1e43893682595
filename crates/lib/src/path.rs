//! Ordered key sequences addressing nested slots.
//!
//! A [`Path`] is a double-ended sequence of [`Key`]s. The tree walkers in
//! [`crate::ops`] consume it one segment at a time; the textual form exists
//! for humans and for the CLI.
//!
//! # Syntax
//!
//! Segments are separated by `::`. A bracketed segment holding only digits is
//! an index, any other bracketed segment is a name taken verbatim (so names
//! may contain the delimiter or brackets):
//!
//! ```
//! use arbor::{Key, Path};
//! use std::str::FromStr;
//!
//! let path = Path::from_str("config::servers[2]::[a::b]")?;
//! assert_eq!(path.len(), 4);
//! assert_eq!(path.back(), &Key::from("a::b"));
//! assert_eq!(path.to_string(), "config::servers[2]::[a::b]");
//! # Ok::<(), arbor::path::PathError>(())
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::PATH_DELIMITER;
use crate::key::Key;

/// Error type for path parsing failures.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A `[` without its closing `]`.
    #[error("Unclosed bracket at byte {position}")]
    UnclosedBracket { position: usize },

    /// `[]` carries neither an index nor a name.
    #[error("Empty bracketed segment at byte {position}")]
    EmptySegment { position: usize },
}

impl PathError {
    pub fn position(&self) -> usize {
        match self {
            PathError::UnclosedBracket { position } | PathError::EmptySegment { position } => {
                *position
            }
        }
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

static EMPTY_KEY: Key = Key::Empty;

/// Ordered, front/back-mutable key sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    keys: VecDeque<Key>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First key, or [`Key::Empty`] for an empty path.
    pub fn front(&self) -> &Key {
        self.keys.front().unwrap_or(&EMPTY_KEY)
    }

    /// Last key, or [`Key::Empty`] for an empty path.
    pub fn back(&self) -> &Key {
        self.keys.back().unwrap_or(&EMPTY_KEY)
    }

    pub fn push_front(&mut self, key: impl Into<Key>) {
        self.keys.push_front(key.into());
    }

    pub fn push_back(&mut self, key: impl Into<Key>) {
        self.keys.push_back(key.into());
    }

    /// Builder form of [`Path::push_back`].
    pub fn join(mut self, key: impl Into<Key>) -> Self {
        self.push_back(key);
        self
    }

    pub fn pop_front(&mut self) -> Key {
        self.keys.pop_front().unwrap_or_default()
    }

    pub fn pop_back(&mut self) -> Key {
        self.keys.pop_back().unwrap_or_default()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Key> + ExactSizeIterator {
        self.keys.iter()
    }

    /// All keys but the last, plus the last key on its own.
    pub fn split_last(&self) -> (Path, Key) {
        let mut parent = self.clone();
        let last = parent.pop_back();
        (parent, last)
    }
}

fn needs_brackets(name: &str) -> bool {
    name.is_empty() || name.contains(PATH_DELIMITER) || name.contains('[') || name.contains(']')
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.keys {
            match key {
                Key::Empty => continue,
                Key::Index(idx) => write!(f, "[{idx}]")?,
                Key::Name(name) => {
                    if !first {
                        f.write_str(PATH_DELIMITER)?;
                    }
                    if needs_brackets(name) {
                        write!(f, "[{name}]")?;
                    } else {
                        f.write_str(name)?;
                    }
                }
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = Path::new();
        let mut pos = 0;
        let bytes = s.as_bytes();

        if s.starts_with(PATH_DELIMITER) {
            pos = PATH_DELIMITER.len();
        }

        while pos < s.len() {
            if s[pos..].starts_with(PATH_DELIMITER) {
                pos += PATH_DELIMITER.len();
                continue;
            }

            if bytes[pos] == b'[' {
                let close = s[pos + 1..]
                    .find(']')
                    .map(|off| pos + 1 + off)
                    .ok_or(PathError::UnclosedBracket { position: pos })?;
                let inner = &s[pos + 1..close];
                if inner.is_empty() {
                    return Err(PathError::EmptySegment { position: pos });
                }
                if inner.bytes().all(|b| b.is_ascii_digit()) {
                    match inner.parse::<usize>() {
                        Ok(idx) => path.push_back(idx),
                        Err(_) => path.push_back(inner),
                    }
                } else {
                    path.push_back(inner);
                }
                pos = close + 1;
                continue;
            }

            let rest = &s[pos..];
            let end = [rest.find(PATH_DELIMITER), rest.find('[')]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(rest.len());
            let name = &rest[..end];
            if !name.is_empty() {
                path.push_back(name);
            }
            pos += end;
        }

        Ok(path)
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Self { keys: keys.into() }
    }
}

impl From<Key> for Path {
    fn from(key: Key) -> Self {
        Self {
            keys: VecDeque::from([key]),
        }
    }
}

impl From<&str> for Path {
    /// Single-segment path; use [`str::parse`] for the `::` syntax.
    fn from(name: &str) -> Self {
        Key::from(name).into()
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Path {
    type Item = Key;
    type IntoIter = std::collections::vec_deque::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Key;
    type IntoIter = std::collections::vec_deque::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Build a [`Path`] from a list of key-convertible segments.
///
/// ```
/// use arbor::{Key, path};
///
/// let p = path!["users", 3usize, "name"];
/// assert_eq!(p.len(), 3);
/// assert_eq!(p.front(), &Key::from("users"));
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::new()
    };
    ($($segment:expr),+ $(,)?) => {{
        let mut path = $crate::Path::new();
        $(
            path.push_back($segment);
        )+
        path
    }};
}
