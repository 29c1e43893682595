//! Value, key, path and timestamp tests
//!
//! Unit tests next to each module cover the details; these exercise the
//! model through nodes the way callers use it.

mod path_tests;
mod timestamp_tests;
mod value_tests;
