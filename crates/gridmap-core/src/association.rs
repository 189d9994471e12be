//! Snapshot-plus-diff representation of one relationship's row set.
//!
//! An [`Association`] mirrors the [`Tuple`](crate::Tuple) model one level up:
//! an immutable [`AssociationSnapshot`] mapping [`RowKey`]s to row tuples as
//! last read from the store, plus an ordered, append-only log of
//! [`AssociationOperation`]s. Reads merge the log over the snapshot; a
//! [`AssociationOperation::Clear`] entry acts as a barrier that empties the
//! merged view, with later entries applying on the emptied state.
//!
//! The log retains every entry in order, including the `Clear`, so a dialect
//! can either replay it incrementally or rebuild the row set wholesale.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::tuple::Tuple;
use crate::types::RowKey;

/// The read-only row set of an association at the time it was loaded.
///
/// Empty for associations not present in the store yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationSnapshot {
    rows: HashMap<RowKey, Tuple>,
}

impl AssociationSnapshot {
    /// An empty snapshot, for associations not yet present in the store.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from a row map.
    #[must_use]
    pub fn new(rows: HashMap<RowKey, Tuple>) -> Self {
        Self { rows }
    }

    /// Get a row by key.
    #[inline]
    #[must_use]
    pub fn get(&self, row_key: &RowKey) -> Option<&Tuple> {
        self.rows.get(row_key)
    }

    /// Iterate over the snapshot's row keys.
    pub fn row_keys(&self) -> impl Iterator<Item = &RowKey> {
        self.rows.keys()
    }

    /// Number of rows in the snapshot.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(RowKey, Tuple)> for AssociationSnapshot {
    fn from_iter<I: IntoIterator<Item = (RowKey, Tuple)>>(iter: I) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}

/// One pending change to an association's row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssociationOperation {
    /// Put a row under the given key.
    Put {
        /// The row key.
        row_key: RowKey,
        /// The row tuple.
        row: Tuple,
    },
    /// Mark a row as present but carrying no data.
    PutNull {
        /// The row key.
        row_key: RowKey,
    },
    /// Remove a row.
    Remove {
        /// The row key.
        row_key: RowKey,
    },
    /// Drop every row, snapshot and pending alike.
    Clear,
}

impl AssociationOperation {
    /// The row key this operation targets, if any.
    #[must_use]
    pub fn row_key(&self) -> Option<&RowKey> {
        match self {
            Self::Put { row_key, .. } | Self::PutNull { row_key } | Self::Remove { row_key } => {
                Some(row_key)
            }
            Self::Clear => None,
        }
    }
}

/// Snapshot-plus-diff representation of one relationship's row set.
///
/// Confined to one unit of work, like [`Tuple`](crate::Tuple).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Association {
    snapshot: AssociationSnapshot,
    operations: Vec<AssociationOperation>,
}

impl Association {
    /// Create an association for a new relationship, over an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an association over the given snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: AssociationSnapshot) -> Self {
        Self { snapshot, operations: Vec::new() }
    }

    /// Get the current row under a key.
    ///
    /// The most recent pending operation for the key wins; a `Clear` between
    /// the snapshot and the read hides snapshot rows. A pending
    /// [`AssociationOperation::PutNull`] or [`AssociationOperation::Remove`]
    /// reads as no row.
    #[must_use]
    pub fn get(&self, row_key: &RowKey) -> Option<&Tuple> {
        for op in self.operations.iter().rev() {
            match op {
                AssociationOperation::Put { row_key: key, row } if key == row_key => {
                    return Some(row);
                }
                AssociationOperation::PutNull { row_key: key }
                | AssociationOperation::Remove { row_key: key }
                    if key == row_key =>
                {
                    return None;
                }
                AssociationOperation::Clear => return None,
                _ => {}
            }
        }
        self.snapshot.get(row_key)
    }

    /// Append a row write.
    pub fn put(&mut self, row_key: RowKey, row: Tuple) {
        self.operations.push(AssociationOperation::Put { row_key, row });
    }

    /// Append a null row write: the key stays listed, the row reads as absent.
    pub fn put_null(&mut self, row_key: RowKey) {
        self.operations.push(AssociationOperation::PutNull { row_key });
    }

    /// Append a row removal.
    ///
    /// Removing a row that was never written is legal and simply appended.
    pub fn remove(&mut self, row_key: RowKey) {
        self.operations.push(AssociationOperation::Remove { row_key });
    }

    /// Append a clear of the whole row set.
    pub fn clear(&mut self) {
        self.operations.push(AssociationOperation::Clear);
    }

    /// The ordered log of pending operations.
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[AssociationOperation] {
        &self.operations
    }

    /// The read-only snapshot this association was created over.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &AssociationSnapshot {
        &self.snapshot
    }

    /// The logical row keys: snapshot rows plus pending additions, minus
    /// pending removals, restarting from empty at the latest `Clear`.
    #[must_use]
    pub fn row_keys(&self) -> HashSet<&RowKey> {
        let mut keys: HashSet<&RowKey> = self.snapshot.row_keys().collect();
        for op in &self.operations {
            match op {
                AssociationOperation::Put { row_key, .. }
                | AssociationOperation::PutNull { row_key } => {
                    keys.insert(row_key);
                }
                AssociationOperation::Remove { row_key } => {
                    keys.remove(row_key);
                }
                AssociationOperation::Clear => keys.clear(),
            }
        }
        keys
    }

    /// Number of rows in the merged view.
    #[must_use]
    pub fn size(&self) -> usize {
        self.row_keys().len()
    }

    /// Whether the merged view has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_keys().is_empty()
    }

    /// Whether any operations are pending.
    #[inline]
    #[must_use]
    pub fn has_pending_operations(&self) -> bool {
        !self.operations.is_empty()
    }
}
