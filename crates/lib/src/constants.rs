//! Constants used throughout the Arbor library.
//!
//! This module provides central definitions for the positional key sentinels,
//! clock resolution and the guards that bound recursive walks.

/// Positional index addressing the first element of a container.
pub const IDX_BEGIN: usize = 0;

/// Positional index meaning "one past the end": appends on insert.
pub const IDX_END: usize = usize::MAX;

/// Positional index addressing the existing final element (or the first one
/// when the container holds at most one element).
pub const IDX_LAST: usize = usize::MAX - 1;

/// Maximum number of empty slots an array `set` may add past its end in one call.
pub const MAX_AUTO_GROW: usize = 1000;

/// Logical clock resolution: one tick is 100 ns.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Timestamp sentinel carried by values that were never written.
pub const ABSENT_TIMESTAMP: i64 = i64::MIN;

/// Separator between path segments in the textual path syntax.
pub const PATH_DELIMITER: &str = "::";

/// Upper bound on parent-chain walks (cycle checks, path reconstruction).
pub const MAX_TREE_DEPTH: usize = 4096;

/// Upper bound on nesting accepted by the JSON codec.
pub const JSON_MAX_DEPTH: usize = 512;

/// Upper bound on element nesting accepted by the XML codec.
pub const XML_MAX_DEPTH: usize = 512;

/// Key prefix marking a map entry as an XML attribute.
pub const XML_ATTRIBUTE_PREFIX: &str = "-";

/// Key holding an element's inner text.
pub const XML_TEXT_NAME: &str = "#text";
