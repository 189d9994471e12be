//! Snapshot-plus-diff representation of one record.
//!
//! A [`Tuple`] (think of it as a row) pairs an immutable [`TupleSnapshot`] -
//! the record's state as last read from the store, possibly empty for a new
//! record - with an ordered, append-only log of [`TupleOperation`]s recording
//! the changes applied since. Reads merge the log over the snapshot; the
//! snapshot itself is never touched.
//!
//! Dialects consume the log and reproduce it against the datastore, either
//! incrementally (native `$set`/`$unset`-style calls) or by replaying it onto
//! a full rewrite of the record. Because of that, repeated writes to the same
//! column are deliberately *not* deduplicated: every entry is retained in
//! order.
//!
//! # Example
//!
//! ```
//! use gridmap_core::{Tuple, TupleSnapshot, Value};
//!
//! let snapshot = TupleSnapshot::from_iter([("name", Value::from("Sun"))]);
//! let mut tuple = Tuple::from_snapshot(snapshot);
//!
//! tuple.put("name", "Alpha");
//! tuple.put("age", 5i64);
//!
//! assert_eq!(tuple.get("name"), Some(&Value::String("Alpha".into())));
//! assert_eq!(tuple.get("age"), Some(&Value::Int(5)));
//! assert_eq!(tuple.operations().len(), 2);
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::Value;

static NULL: Value = Value::Null;

/// The read-only state of a record at the time it was loaded.
///
/// Empty for records that do not exist in the store yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TupleSnapshot {
    columns: HashMap<String, Value>,
}

impl TupleSnapshot {
    /// An empty snapshot, for records not yet present in the store.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from a column map.
    #[must_use]
    pub fn new(columns: HashMap<String, Value>) -> Self {
        Self { columns }
    }

    /// Get a column value.
    #[inline]
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Whether the snapshot contains the given column.
    #[inline]
    #[must_use]
    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Iterate over the snapshot's column names.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of columns in the snapshot.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the snapshot has no columns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for TupleSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self { columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

/// One pending change to a tuple column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TupleOperation {
    /// Set a column to a non-null value.
    Put {
        /// The column name.
        column: String,
        /// The new value.
        value: Value,
    },
    /// Set a column to null, keeping it part of the record.
    PutNull {
        /// The column name.
        column: String,
    },
    /// Remove a column from the record.
    Remove {
        /// The column name.
        column: String,
    },
}

impl TupleOperation {
    /// The column this operation targets.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Put { column, .. } | Self::PutNull { column } | Self::Remove { column } => column,
        }
    }
}

/// Snapshot-plus-diff representation of one record.
///
/// Confined to one unit of work: created at first access, discarded at flush
/// or rollback, and carrying no internal locking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    snapshot: TupleSnapshot,
    operations: Vec<TupleOperation>,
}

impl Tuple {
    /// Create a tuple for a new record, over an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tuple over the given snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: TupleSnapshot) -> Self {
        Self { snapshot, operations: Vec::new() }
    }

    /// Get the current value of a column.
    ///
    /// The most recent pending operation for the column wins; columns never
    /// written fall through to the snapshot. A pending [`TupleOperation::PutNull`]
    /// reads as [`Value::Null`], a pending [`TupleOperation::Remove`] as absent.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        for op in self.operations.iter().rev() {
            if op.column() == column {
                return match op {
                    TupleOperation::Put { value, .. } => Some(value),
                    TupleOperation::PutNull { .. } => Some(&NULL),
                    TupleOperation::Remove { .. } => None,
                };
            }
        }
        self.snapshot.get(column)
    }

    /// Append a write for a column.
    ///
    /// Passing [`Value::Null`] records a [`TupleOperation::PutNull`], keeping
    /// the column part of the record.
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        match value.into() {
            Value::Null => self.operations.push(TupleOperation::PutNull { column }),
            value => self.operations.push(TupleOperation::Put { column, value }),
        }
    }

    /// Append a null write for a column.
    pub fn put_null(&mut self, column: impl Into<String>) {
        self.operations.push(TupleOperation::PutNull { column: column.into() });
    }

    /// Append a removal of a column.
    ///
    /// Removing a column that was never written is legal; the entry is
    /// appended and dialects tolerate the no-op unset.
    pub fn remove(&mut self, column: impl Into<String>) {
        self.operations.push(TupleOperation::Remove { column: column.into() });
    }

    /// The ordered log of pending operations.
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[TupleOperation] {
        &self.operations
    }

    /// The read-only snapshot this tuple was created over.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &TupleSnapshot {
        &self.snapshot
    }

    /// The logical column names: snapshot columns plus pending additions,
    /// minus pending removals.
    #[must_use]
    pub fn column_names(&self) -> HashSet<&str> {
        let mut names: HashSet<&str> = self.snapshot.column_names().collect();
        for op in &self.operations {
            match op {
                TupleOperation::Put { column, .. } | TupleOperation::PutNull { column } => {
                    names.insert(column);
                }
                TupleOperation::Remove { column } => {
                    names.remove(column.as_str());
                }
            }
        }
        names
    }

    /// Whether any operations are pending.
    #[inline]
    #[must_use]
    pub fn has_pending_operations(&self) -> bool {
        !self.operations.is_empty()
    }
}
