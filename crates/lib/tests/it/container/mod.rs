//! Storage backend tests
//!
//! The backends are exercised through nodes: maps remember erasures,
//! arrays grow on demand, and indices address map entries by position.

mod array_tests;
