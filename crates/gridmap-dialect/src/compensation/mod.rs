//! The compensation operation log.
//!
//! A closed set of records describing writes a dialect has applied or was
//! about to apply, kept for an external observer - a test harness asserting
//! on dialect invocations, or a compensating-transaction layer undoing work
//! after a partial failure. The log is pure bookkeeping: it performs no I/O
//! and knows nothing about the write pipeline's queue internals.
//!
//! Optimistic variants carry the pre-image (`old_lock_state`) that guarded
//! the write, which is exactly what a compensating action needs to restore.
//! [`ExecuteBatch`] and [`FlushPendingOperations`] wrap the ordered
//! sub-operations the batch contained.
//!
//! Every record exposes its [`kind`](GridDialectOperation::kind) and
//! type-safe per-variant accessors (`as_*`) that fail fast with a
//! [`DowncastMismatch`] when the requested facet does not match the actual
//! kind.

mod collector;

use gridmap_core::{Association, AssociationKey, EntityKey, Tuple, TupleSnapshot};
use thiserror::Error;

use crate::batch::Operation;

pub use collector::{CollectingDialect, FailedOperation, OperationCollector};

/// The kind of a [`GridDialectOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A fresh tuple was produced for a record about to be created.
    CreateTuple,
    /// A tuple's pending operations were written.
    InsertOrUpdateTuple,
    /// A record was removed.
    RemoveTuple,
    /// A record was removed under an optimistic lock.
    RemoveTupleWithOptimisticLock,
    /// A record was replaced under an optimistic lock.
    UpdateTupleWithOptimisticLock,
    /// A fresh association was produced for a relationship about to be
    /// created.
    CreateAssociation,
    /// An association's pending operations were written.
    InsertOrUpdateAssociation,
    /// A relationship was removed.
    RemoveAssociation,
    /// A whole queue of operations was executed as one batch.
    ExecuteBatch,
    /// One entity's pending group was flushed early.
    FlushPendingOperations,
}

/// The wrong variant accessor was used on a [`GridDialectOperation`].
///
/// This is a programming error in the observer, not a data error.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("requested operation kind {requested:?}, but actual kind is {actual:?}")]
pub struct DowncastMismatch {
    /// The kind the accessor asked for.
    pub requested: OperationKind,
    /// The record's actual kind.
    pub actual: OperationKind,
}

/// Record of a fresh tuple produced for a record about to be created.
#[derive(Debug, Clone)]
pub struct CreateTuple {
    /// The record's key.
    pub key: EntityKey,
}

/// Record of a tuple write.
#[derive(Debug, Clone)]
pub struct InsertOrUpdateTuple {
    /// The record's key.
    pub key: EntityKey,
    /// The snapshot-plus-diff value that was written.
    pub tuple: Tuple,
}

/// Record of a record removal.
#[derive(Debug, Clone)]
pub struct RemoveTuple {
    /// The record's key.
    pub key: EntityKey,
}

/// Record of an optimistic record removal, with its guarding pre-image.
#[derive(Debug, Clone)]
pub struct RemoveTupleWithOptimisticLock {
    /// The record's key.
    pub key: EntityKey,
    /// The snapshot the removal was conditioned on.
    pub old_lock_state: TupleSnapshot,
}

/// Record of an optimistic record replacement, with its guarding pre-image.
#[derive(Debug, Clone)]
pub struct UpdateTupleWithOptimisticLock {
    /// The record's key.
    pub key: EntityKey,
    /// The snapshot the update was conditioned on.
    pub old_lock_state: TupleSnapshot,
    /// The replacement value.
    pub new_tuple: Tuple,
}

/// Record of a fresh association produced for a relationship about to be
/// created.
#[derive(Debug, Clone)]
pub struct CreateAssociation {
    /// The relationship's key.
    pub key: AssociationKey,
}

/// Record of an association write.
#[derive(Debug, Clone)]
pub struct InsertOrUpdateAssociation {
    /// The relationship's key.
    pub key: AssociationKey,
    /// The snapshot-plus-diff row set that was written.
    pub association: Association,
}

/// Record of a relationship removal.
#[derive(Debug, Clone)]
pub struct RemoveAssociation {
    /// The relationship's key.
    pub key: AssociationKey,
}

/// Record of a batch execution, wrapping the batch's operations in order.
#[derive(Debug, Clone)]
pub struct ExecuteBatch {
    /// The batched operations, oldest first.
    pub operations: Vec<GridDialectOperation>,
}

/// Record of an early per-entity flush, wrapping the flushed group in order.
#[derive(Debug, Clone)]
pub struct FlushPendingOperations {
    /// The flushed entity's key.
    pub key: EntityKey,
    /// The flushed operations, oldest first.
    pub operations: Vec<GridDialectOperation>,
}

/// One entry of the compensation log.
///
/// Created and consumed entirely within an observer's recording window; the
/// log holds owned copies of keys and values, so entries stay valid after
/// the unit of work that produced them is gone.
#[derive(Debug, Clone)]
pub enum GridDialectOperation {
    /// See [`CreateTuple`].
    CreateTuple(CreateTuple),
    /// See [`InsertOrUpdateTuple`].
    InsertOrUpdateTuple(InsertOrUpdateTuple),
    /// See [`RemoveTuple`].
    RemoveTuple(RemoveTuple),
    /// See [`RemoveTupleWithOptimisticLock`].
    RemoveTupleWithOptimisticLock(RemoveTupleWithOptimisticLock),
    /// See [`UpdateTupleWithOptimisticLock`].
    UpdateTupleWithOptimisticLock(UpdateTupleWithOptimisticLock),
    /// See [`CreateAssociation`].
    CreateAssociation(CreateAssociation),
    /// See [`InsertOrUpdateAssociation`].
    InsertOrUpdateAssociation(InsertOrUpdateAssociation),
    /// See [`RemoveAssociation`].
    RemoveAssociation(RemoveAssociation),
    /// See [`ExecuteBatch`].
    ExecuteBatch(ExecuteBatch),
    /// See [`FlushPendingOperations`].
    FlushPendingOperations(FlushPendingOperations),
}

macro_rules! downcast_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns [`DowncastMismatch`] if this record is of another kind.
        pub fn $name(&self) -> Result<&$variant, DowncastMismatch> {
            match self {
                Self::$variant(op) => Ok(op),
                other => Err(DowncastMismatch {
                    requested: OperationKind::$variant,
                    actual: other.kind(),
                }),
            }
        }
    };
}

impl GridDialectOperation {
    /// This record's kind.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTuple(_) => OperationKind::CreateTuple,
            Self::InsertOrUpdateTuple(_) => OperationKind::InsertOrUpdateTuple,
            Self::RemoveTuple(_) => OperationKind::RemoveTuple,
            Self::RemoveTupleWithOptimisticLock(_) => OperationKind::RemoveTupleWithOptimisticLock,
            Self::UpdateTupleWithOptimisticLock(_) => OperationKind::UpdateTupleWithOptimisticLock,
            Self::CreateAssociation(_) => OperationKind::CreateAssociation,
            Self::InsertOrUpdateAssociation(_) => OperationKind::InsertOrUpdateAssociation,
            Self::RemoveAssociation(_) => OperationKind::RemoveAssociation,
            Self::ExecuteBatch(_) => OperationKind::ExecuteBatch,
            Self::FlushPendingOperations(_) => OperationKind::FlushPendingOperations,
        }
    }

    downcast_accessor!(
        /// This record as a [`CreateTuple`].
        as_create_tuple,
        CreateTuple
    );
    downcast_accessor!(
        /// This record as an [`InsertOrUpdateTuple`].
        as_insert_or_update_tuple,
        InsertOrUpdateTuple
    );
    downcast_accessor!(
        /// This record as a [`RemoveTuple`].
        as_remove_tuple,
        RemoveTuple
    );
    downcast_accessor!(
        /// This record as a [`RemoveTupleWithOptimisticLock`].
        as_remove_tuple_with_optimistic_lock,
        RemoveTupleWithOptimisticLock
    );
    downcast_accessor!(
        /// This record as an [`UpdateTupleWithOptimisticLock`].
        as_update_tuple_with_optimistic_lock,
        UpdateTupleWithOptimisticLock
    );
    downcast_accessor!(
        /// This record as a [`CreateAssociation`].
        as_create_association,
        CreateAssociation
    );
    downcast_accessor!(
        /// This record as an [`InsertOrUpdateAssociation`].
        as_insert_or_update_association,
        InsertOrUpdateAssociation
    );
    downcast_accessor!(
        /// This record as a [`RemoveAssociation`].
        as_remove_association,
        RemoveAssociation
    );
    downcast_accessor!(
        /// This record as an [`ExecuteBatch`].
        as_execute_batch,
        ExecuteBatch
    );
    downcast_accessor!(
        /// This record as a [`FlushPendingOperations`].
        as_flush_pending_operations,
        FlushPendingOperations
    );
}

impl From<&Operation> for GridDialectOperation {
    /// Renders a queued write as a compensation record.
    fn from(operation: &Operation) -> Self {
        match operation {
            Operation::InsertOrUpdateTuple { key, tuple, .. } => {
                Self::InsertOrUpdateTuple(InsertOrUpdateTuple {
                    key: key.clone(),
                    tuple: tuple.clone(),
                })
            }
            Operation::RemoveTuple { key, .. } => {
                Self::RemoveTuple(RemoveTuple { key: key.clone() })
            }
            Operation::InsertOrUpdateAssociation { key, association, .. } => {
                Self::InsertOrUpdateAssociation(InsertOrUpdateAssociation {
                    key: key.clone(),
                    association: association.clone(),
                })
            }
            Operation::RemoveAssociation { key, .. } => {
                Self::RemoveAssociation(RemoveAssociation { key: key.clone() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gridmap_core::{EntityKeyMetadata, Value};

    use super::*;

    fn key(id: i64) -> EntityKey {
        EntityKey::new(EntityKeyMetadata::new("User", ["id"]), vec![Value::Int(id)])
    }

    #[test]
    fn kind_matches_variant() {
        let op = GridDialectOperation::CreateTuple(CreateTuple { key: key(1) });
        assert_eq!(op.kind(), OperationKind::CreateTuple);
    }

    #[test]
    fn downcast_succeeds_on_matching_kind() {
        let op = GridDialectOperation::RemoveTuple(RemoveTuple { key: key(1) });
        let remove = op.as_remove_tuple().expect("kinds match");
        assert_eq!(remove.key, key(1));
    }

    #[test]
    fn downcast_fails_fast_on_mismatch() {
        let op = GridDialectOperation::RemoveTuple(RemoveTuple { key: key(1) });
        let err = op.as_execute_batch().expect_err("kinds differ");
        assert_eq!(
            err,
            DowncastMismatch {
                requested: OperationKind::ExecuteBatch,
                actual: OperationKind::RemoveTuple,
            }
        );
    }

    #[test]
    fn optimistic_records_carry_the_pre_image() {
        let pre_image = gridmap_core::TupleSnapshot::from_iter([("version", Value::Int(3))]);
        let op = GridDialectOperation::UpdateTupleWithOptimisticLock(
            UpdateTupleWithOptimisticLock {
                key: key(1),
                old_lock_state: pre_image.clone(),
                new_tuple: Tuple::new(),
            },
        );

        let update = op.as_update_tuple_with_optimistic_lock().expect("kinds match");
        assert_eq!(update.old_lock_state, pre_image);
    }

    #[test]
    fn queued_writes_render_as_records() {
        use gridmap_options::OptionsContainer;

        let mut tuple = Tuple::new();
        tuple.put("name", "a");
        let queued = Operation::InsertOrUpdateTuple {
            key: key(1),
            tuple,
            options: OptionsContainer::empty(),
        };

        let record = GridDialectOperation::from(&queued);
        assert_eq!(record.kind(), OperationKind::InsertOrUpdateTuple);
        assert_eq!(record.as_insert_or_update_tuple().expect("kinds match").key, key(1));
    }
}
