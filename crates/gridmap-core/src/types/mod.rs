//! Core data types: column values and identity keys.

mod keys;
mod value;

pub use keys::{AssociationKey, AssociationKeyMetadata, EntityKey, EntityKeyMetadata, RowKey};
pub use value::Value;
