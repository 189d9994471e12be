//! GridMap Dialect
//!
//! This crate is the coordination layer between the model types and the
//! stores: the SPI store plugins implement, the batched write pipeline, and
//! the compensation operation log.
//!
//! # Overview
//!
//! - [`spi`] - the dialect capability set: [`GridDialect`] base CRUD plus
//!   the [`BatchableDialect`], [`GroupingByEntityDialect`],
//!   [`OptimisticLockingDialect`], and [`QueryableDialect`] facets, the
//!   per-call contexts, and the [`CasOutcome`] compare-and-swap result
//! - [`batch`] - [`OperationsQueue`], per-entity grouping, and the
//!   [`BatchingDialect`] wrapper that populates the queue
//! - [`compensation`] - the [`GridDialectOperation`] log and the
//!   [`CollectingDialect`] observer that records write intents
//! - [`backends`] - the in-memory reference dialect
//!
//! # Example
//!
//! ```
//! use gridmap_core::{EntityKey, EntityKeyMetadata, Tuple, Value};
//! use gridmap_dialect::backends::MemoryDialect;
//! use gridmap_dialect::batch::BatchingDialect;
//! use gridmap_dialect::spi::{GridDialect, TupleContext};
//! use gridmap_options::OptionsContainer;
//!
//! let options = OptionsContainer::empty();
//! let ctx = TupleContext::new(&options);
//! let mut dialect = BatchingDialect::new(MemoryDialect::new());
//!
//! let key = EntityKey::new(EntityKeyMetadata::new("User", ["id"]), vec![Value::Int(1)]);
//! let mut tuple = Tuple::new();
//! tuple.put("name", "Alice");
//!
//! // The write is queued, not yet in the store
//! dialect.insert_or_update_tuple(&key, &tuple, &ctx)?;
//! assert_eq!(dialect.queue().size(), 1);
//!
//! // Flush drains the queue into the store in one batch
//! dialect.flush()?;
//! let stored = dialect.get_tuple(&key, &ctx)?.expect("stored");
//! assert_eq!(stored.get("name"), Some(&Value::String("Alice".into())));
//! # Ok::<(), gridmap_dialect::spi::DialectError>(())
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod backends;
pub mod batch;
pub mod compensation;
pub mod spi;

// Re-export commonly used types
pub use batch::{
    BatchingDialect, GroupedChangesToEntityOperation, Operation, OperationsQueue, QueueError,
};
pub use compensation::{
    CollectingDialect, DowncastMismatch, GridDialectOperation, OperationCollector, OperationKind,
};
pub use spi::{
    AssociationContext, BatchableDialect, CasOutcome, DialectError, DialectResult, GridDialect,
    GroupingByEntityDialect, OptimisticLockingDialect, QueryableDialect, TupleContext,
};
