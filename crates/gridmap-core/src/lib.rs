//! GridMap Core
//!
//! This crate provides the store-agnostic model types a mapping engine
//! mutates and grid dialects consume: the snapshot-plus-diff representation
//! of records and relationships, and the identity types that address them.
//!
//! # Overview
//!
//! - **Identifiers**: [`EntityKey`], [`AssociationKey`], and [`RowKey`] for
//!   addressing records, relationships, and relationship rows, with their
//!   shared metadata parts ([`EntityKeyMetadata`], [`AssociationKeyMetadata`])
//! - **Values**: the [`Value`] enum covering every column value a dialect
//!   may be handed
//! - **Records**: [`Tuple`] - an immutable [`TupleSnapshot`] plus an ordered
//!   log of pending [`TupleOperation`]s
//! - **Relationships**: [`Association`] - an immutable
//!   [`AssociationSnapshot`] plus an ordered log of pending
//!   [`AssociationOperation`]s
//!
//! # Example
//!
//! ```
//! use gridmap_core::{Tuple, TupleSnapshot, Value};
//!
//! // State as last read from the store
//! let snapshot = TupleSnapshot::from_iter([("name", Value::from("Sun"))]);
//!
//! // The unit of work mutates the tuple by appending operations
//! let mut tuple = Tuple::from_snapshot(snapshot);
//! tuple.put("name", "Alpha");
//! tuple.put("age", 5i64);
//!
//! // Reads merge the pending log over the snapshot
//! assert_eq!(tuple.get("name"), Some(&Value::String("Alpha".into())));
//! assert_eq!(tuple.operations().len(), 2);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Values and key types
//! - [`tuple`] - Record snapshot + diff
//! - [`association`] - Relationship snapshot + diff

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod association;
pub mod tuple;
pub mod types;


// Re-export commonly used types
pub use association::{Association, AssociationOperation, AssociationSnapshot};
pub use tuple::{Tuple, TupleOperation, TupleSnapshot};
pub use types::{
    AssociationKey, AssociationKeyMetadata, EntityKey, EntityKeyMetadata, RowKey, Value,
};
