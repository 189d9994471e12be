//! GridMap - Persistence Abstraction for Non-Relational Stores
//!
//! GridMap lets an object-mapping engine write structured records into
//! heterogeneous non-relational stores through one pluggable dialect
//! contract. The core is store-agnostic: it models records and
//! relationships as snapshot-plus-diff values, queues writes for batched
//! execution, resolves configuration across scopes, and defines the
//! optimistic compare-and-swap contract stores without native transactions
//! rely on. All physical I/O happens behind dialect plugins.
//!
//! # Quick Start
//!
//! ```
//! use gridmap::{
//!     BatchingDialect, EntityKey, EntityKeyMetadata, GridDialect, MemoryDialect,
//!     OptionsContainer, Tuple, TupleContext, Value,
//! };
//!
//! let options = OptionsContainer::empty();
//! let ctx = TupleContext::new(&options);
//!
//! // Wrap a store dialect with write batching
//! let mut dialect = BatchingDialect::new(MemoryDialect::new());
//!
//! // The unit of work mutates a tuple and hands it to the dialect
//! let key = EntityKey::new(EntityKeyMetadata::new("Planet", ["id"]), vec![Value::Int(3)]);
//! let mut tuple = Tuple::new();
//! tuple.put("name", "Earth");
//! dialect.insert_or_update_tuple(&key, &tuple, &ctx)?;
//!
//! // Writes hit the store when the unit of work flushes
//! dialect.flush()?;
//! assert!(dialect.get_tuple(&key, &ctx)?.is_some());
//! # Ok::<(), gridmap::DialectError>(())
//! ```
//!
//! # Crates
//!
//! This facade re-exports the workspace's public surface:
//!
//! - `gridmap-core` - values, keys, [`Tuple`], [`Association`]
//! - `gridmap-options` - option declaration and resolution
//! - `gridmap-dialect` - the dialect SPI, write pipeline, compensation log,
//!   and the in-memory reference backend
//! - `gridmap-query` - native-query wrapper and parameter model
//!
//! plus the bootstrap pieces defined here:
//!
//! - [`config`] - the flat property map read once at bootstrap
//! - [`scopes`] - global/entity/property option resolution

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod scopes;

pub use config::{ConfigError, ConfigResult, ConfigurationProperties};
pub use scopes::ScopedOptions;

pub use gridmap_core::{
    Association, AssociationKey, AssociationKeyMetadata, AssociationOperation,
    AssociationSnapshot, EntityKey, EntityKeyMetadata, RowKey, Tuple, TupleOperation,
    TupleSnapshot, Value,
};
pub use gridmap_dialect::backends::{MemoryDialect, MemoryQuery};
pub use gridmap_dialect::{
    AssociationContext, BatchableDialect, BatchingDialect, CasOutcome, CollectingDialect,
    DialectError, DialectResult, DowncastMismatch, GridDialect, GridDialectOperation,
    GroupedChangesToEntityOperation, GroupingByEntityDialect, Operation, OperationCollector,
    OperationKind, OperationsQueue, OptimisticLockingDialect, QueryableDialect, QueueError,
    TupleContext,
};
pub use gridmap_options::{OptionsContainer, OptionsContainerBuilder, StoreOption};
pub use gridmap_query::{
    BackendQuery, GridType, NoopParameterMetadataBuilder, ParameterMetadata,
    ParameterMetadataBuilder, ParameterParseError, QueryParameters, RowSelection,
    TokenizerParameterMetadataBuilder, TypedValue,
};
