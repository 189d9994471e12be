//! GridMap Query
//!
//! This crate provides the collaborator-facing query parameter model
//! consumed by query-capable dialects:
//!
//! - [`BackendQuery`] - a store-native query object, kept opaque to the
//!   core, plus optional single-entity-type metadata for result
//!   materialization
//! - [`QueryParameters`] - row selection (offset/limit) and named
//!   parameters, each pre-resolved to its store-level [`GridType`]
//! - [`ParameterMetadataBuilder`] - the pure parsing contract that discovers
//!   a native query's placeholders, with a tokenizer-based and a no-op
//!   implementation
//!
//! # Example
//!
//! ```
//! use gridmap_query::{
//!     BackendQuery, ParameterMetadataBuilder, QueryParameters, RowSelection,
//!     TokenizerParameterMetadataBuilder,
//! };
//!
//! let native = "FROM User u WHERE u.name = :name";
//!
//! let metadata = TokenizerParameterMetadataBuilder::new()
//!     .build_parameter_metadata(native)?;
//! assert!(metadata.named_parameters().contains("name"));
//!
//! let query = BackendQuery::new(native.to_owned());
//! let params = QueryParameters::none()
//!     .with_parameter("name", "Alice")
//!     .with_row_selection(RowSelection::new(None, Some(10)));
//!
//! assert_eq!(params.row_selection().max_rows(), Some(10));
//! # Ok::<(), gridmap_query::ParameterParseError>(())
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

mod metadata;
mod params;
mod query;

pub use metadata::{
    NoopParameterMetadataBuilder, ParameterMetadata, ParameterMetadataBuilder,
    ParameterParseError, TokenizerParameterMetadataBuilder,
};
pub use params::{GridType, QueryParameters, RowSelection, TypedValue};
pub use query::BackendQuery;
