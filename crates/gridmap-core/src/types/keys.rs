//! Identity types for records, relationships, and relationship rows.
//!
//! Three kinds of identity exist in the model:
//!
//! - [`EntityKey`] - identifies one record in a table/collection
//! - [`AssociationKey`] - identifies one relationship's row set, from the
//!   owning side
//! - [`RowKey`] - identifies one row within an association's row set
//!
//! Entity and association keys are split into a metadata part
//! ([`EntityKeyMetadata`], [`AssociationKeyMetadata`]) that is shared by
//! every key of one mapped type (table name plus ordered column names), and
//! the per-record column values. All key types are immutable and compare by
//! value across all fields.
//!
//! # Example
//!
//! ```
//! use gridmap_core::{EntityKey, EntityKeyMetadata, Value};
//!
//! let metadata = EntityKeyMetadata::new("User", ["id"]);
//! let key = EntityKey::new(metadata, vec![Value::Int(42)]);
//!
//! assert_eq!(key.table(), "User");
//! assert_eq!(key.column_values(), &[Value::Int(42)]);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::Value;

/// Writes a key as `table[col=value, ...]` for display in messages.
fn write_key(
    f: &mut fmt::Formatter<'_>,
    table: &str,
    names: &[String],
    values: &[Value],
) -> fmt::Result {
    write!(f, "{table}[")?;
    for (i, (name, value)) in names.iter().zip(values).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{name}={value:?}")?;
    }
    write!(f, "]")
}

/// Compares two key values, treating floats by bit pattern.
///
/// Key equality must be reflexive for keys to live in hash maps, so floats
/// inside keys compare by their bit representation rather than IEEE `==`.
fn key_value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| key_value_eq(a, b))
        }
        _ => a == b,
    }
}

/// Feeds one key value into a hasher, consistent with [`key_value_eq`].
fn hash_key_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Int(i) => i.hash(state),
        Value::Float(f) => f.to_bits().hash(state),
        Value::String(s) => s.hash(state),
        Value::Bytes(b) => b.hash(state),
        Value::Array(a) => {
            a.len().hash(state);
            for v in a {
                hash_key_value(v, state);
            }
        }
    }
}

fn key_values_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| key_value_eq(x, y))
}

fn hash_key_values<H: Hasher>(values: &[Value], state: &mut H) {
    values.len().hash(state);
    for v in values {
        hash_key_value(v, state);
    }
}

/// The static part of an entity key: table name plus ordered key column
/// names.
///
/// One metadata value describes every key of a mapped type; an [`EntityKey`]
/// is metadata plus the per-record column values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKeyMetadata {
    table: String,
    column_names: Vec<String>,
}

impl EntityKeyMetadata {
    /// Create metadata for the given table and key column names.
    #[must_use]
    pub fn new<I, S>(table: impl Into<String>, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            column_names: column_names.into_iter().map(Into::into).collect(),
        }
    }

    /// The table/collection name.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The ordered key column names.
    #[inline]
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

/// Identifies one record in a table/collection.
///
/// Immutable; equality and hashing cover the table, column names, and column
/// values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityKey {
    metadata: EntityKeyMetadata,
    column_values: Vec<Value>,
}

impl EntityKey {
    /// Create a key from metadata and the per-record column values.
    ///
    /// # Panics
    ///
    /// Panics if the number of values does not match the metadata's column
    /// count; keys with mismatched arity are a programming error.
    #[must_use]
    pub fn new(metadata: EntityKeyMetadata, column_values: Vec<Value>) -> Self {
        assert_eq!(
            metadata.column_names.len(),
            column_values.len(),
            "entity key for table `{}` expects {} column value(s), got {}",
            metadata.table,
            metadata.column_names.len(),
            column_values.len()
        );
        Self { metadata, column_values }
    }

    /// The table/collection name.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        self.metadata.table()
    }

    /// The shared metadata part of this key.
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &EntityKeyMetadata {
        &self.metadata
    }

    /// The ordered key column names.
    #[inline]
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.metadata.column_names()
    }

    /// The ordered key column values.
    #[inline]
    #[must_use]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_key(f, self.table(), self.column_names(), &self.column_values)
    }
}

impl PartialEq for EntityKey {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && key_values_eq(&self.column_values, &other.column_values)
    }
}

impl Eq for EntityKey {}

impl Hash for EntityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata.hash(state);
        hash_key_values(&self.column_values, state);
    }
}

/// The static part of an association key: owning-side table plus the ordered
/// column names that identify the relationship collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationKeyMetadata {
    table: String,
    column_names: Vec<String>,
}

impl AssociationKeyMetadata {
    /// Create metadata for the given owning-side table and column names.
    #[must_use]
    pub fn new<I, S>(table: impl Into<String>, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            column_names: column_names.into_iter().map(Into::into).collect(),
        }
    }

    /// The owning-side table name.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The ordered column names.
    #[inline]
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

/// Identifies one relationship's row set, from the owning side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationKey {
    metadata: AssociationKeyMetadata,
    column_values: Vec<Value>,
}

impl AssociationKey {
    /// Create a key from metadata and the owning record's column values.
    ///
    /// # Panics
    ///
    /// Panics if the number of values does not match the metadata's column
    /// count.
    #[must_use]
    pub fn new(metadata: AssociationKeyMetadata, column_values: Vec<Value>) -> Self {
        assert_eq!(
            metadata.column_names.len(),
            column_values.len(),
            "association key for table `{}` expects {} column value(s), got {}",
            metadata.table,
            metadata.column_names.len(),
            column_values.len()
        );
        Self { metadata, column_values }
    }

    /// The owning-side table name.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        self.metadata.table()
    }

    /// The shared metadata part of this key.
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &AssociationKeyMetadata {
        &self.metadata
    }

    /// The ordered column names.
    #[inline]
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.metadata.column_names()
    }

    /// The ordered column values.
    #[inline]
    #[must_use]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_key(f, self.table(), self.column_names(), &self.column_values)
    }
}

impl PartialEq for AssociationKey {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && key_values_eq(&self.column_values, &other.column_values)
    }
}

impl Eq for AssociationKey {}

impl Hash for AssociationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata.hash(state);
        hash_key_values(&self.column_values, state);
    }
}

/// Identifies one row within an association's row set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowKey {
    column_names: Vec<String>,
    column_values: Vec<Value>,
}

impl RowKey {
    /// Create a row key from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of names and values differ.
    #[must_use]
    pub fn new<I, S>(column_names: I, column_values: Vec<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names: Vec<String> = column_names.into_iter().map(Into::into).collect();
        assert_eq!(
            column_names.len(),
            column_values.len(),
            "row key expects {} column value(s), got {}",
            column_names.len(),
            column_values.len()
        );
        Self { column_names, column_values }
    }

    /// The ordered column names.
    #[inline]
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// The ordered column values.
    #[inline]
    #[must_use]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }
}

impl PartialEq for RowKey {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names
            && key_values_eq(&self.column_values, &other.column_values)
    }
}

impl Eq for RowKey {}

impl Hash for RowKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.column_names.hash(state);
        hash_key_values(&self.column_values, state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn user_key(id: i64) -> EntityKey {
        EntityKey::new(EntityKeyMetadata::new("User", ["id"]), vec![Value::Int(id)])
    }

    #[test]
    fn entity_key_value_equality() {
        assert_eq!(user_key(1), user_key(1));
        assert_ne!(user_key(1), user_key(2));

        let other_table =
            EntityKey::new(EntityKeyMetadata::new("Order", ["id"]), vec![Value::Int(1)]);
        assert_ne!(user_key(1), other_table);
    }

    #[test]
    fn entity_key_hashes_into_set() {
        let mut set = HashSet::new();
        set.insert(user_key(1));
        set.insert(user_key(1));
        set.insert(user_key(2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&user_key(1)));
    }

    #[test]
    fn float_keys_compare_by_bits() {
        let metadata = EntityKeyMetadata::new("Point", ["x"]);
        let a = EntityKey::new(metadata.clone(), vec![Value::Float(1.5)]);
        let b = EntityKey::new(metadata.clone(), vec![Value::Float(1.5)]);
        assert_eq!(a, b);

        let nan = EntityKey::new(metadata.clone(), vec![Value::Float(f64::NAN)]);
        let nan2 = EntityKey::new(metadata, vec![Value::Float(f64::NAN)]);
        assert_eq!(nan, nan2);
    }

    #[test]
    #[should_panic(expected = "expects 1 column value")]
    fn arity_mismatch_panics() {
        let _ = EntityKey::new(EntityKeyMetadata::new("User", ["id"]), vec![]);
    }

    #[test]
    fn row_key_equality() {
        let a = RowKey::new(["user_id", "role"], vec![Value::Int(1), Value::from("admin")]);
        let b = RowKey::new(["user_id", "role"], vec![Value::Int(1), Value::from("admin")]);
        let c = RowKey::new(["user_id", "role"], vec![Value::Int(2), Value::from("admin")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn composite_association_key() {
        let metadata = AssociationKeyMetadata::new("User_Address", ["user_id"]);
        let key = AssociationKey::new(metadata, vec![Value::Int(7)]);
        assert_eq!(key.table(), "User_Address");
        assert_eq!(key.column_names(), &["user_id".to_owned()]);
    }
}
