//! Tree operation tests
//!
//! Path walking, cloning, comparison, patching and parent repair, run
//! against trees built through the public node API.

mod clone_compare_tests;
