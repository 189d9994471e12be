//! Concrete dialect implementations.
//!
//! Production store dialects live in their own crates and implement the
//! [`spi`](crate::spi) traits; the backend shipped here is the in-memory
//! reference implementation used by tests.

pub mod mem;

pub use mem::{MemoryDialect, MemoryQuery};
