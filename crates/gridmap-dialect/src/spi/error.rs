//! Dialect error types.

use gridmap_core::EntityKey;
use thiserror::Error;

use crate::batch::QueueError;

/// Errors that can occur while a dialect talks to its store.
///
/// Store-specific failures are opaque to the core: dialects render them into
/// the `Store` variant and callers propagate them. Stale optimistic writes
/// are *not* errors - see
/// [`CasOutcome`](crate::spi::CasOutcome).
#[derive(Debug, Error)]
pub enum DialectError {
    /// An operation was attempted on a closed operations queue.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// An insert hit a record that already exists.
    #[error("tuple already exists for key {0}")]
    TupleAlreadyExists(String),

    /// A native query could not be parsed or executed.
    #[error("query error: {0}")]
    Query(String),

    /// The store reported a failure; opaque and store-specific.
    #[error("store error: {0}")]
    Store(String),
}

impl DialectError {
    /// Creates a `TupleAlreadyExists` error for the given key.
    #[must_use]
    pub fn tuple_already_exists(key: &EntityKey) -> Self {
        Self::TupleAlreadyExists(key.to_string())
    }

    /// Returns `true` if this error came from the batched write pipeline
    /// rather than the store.
    #[must_use]
    pub const fn is_queue_closed(&self) -> bool {
        matches!(self, Self::Queue(QueueError::Closed))
    }
}

/// Result type alias for dialect operations.
pub type DialectResult<T> = Result<T, DialectError>;
