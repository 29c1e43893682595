//! Node integration tests
//!
//! Organized by concern: ownership and parent bookkeeping, listeners and
//! rollback, atomic read-modify-write, batched operations, and behaviour
//! under concurrent use.

mod atomic_tests;
mod bulk_tests;
mod concurrency_tests;
mod listener_tests;
mod ownership_tests;
