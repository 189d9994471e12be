//! The batched write pipeline.
//!
//! Writes issued during a unit of work are not sent to the store one by one;
//! they accumulate as [`Operation`]s in an [`OperationsQueue`] and a dialect
//! drains the queue at flush time. The queue keeps two structures in step:
//!
//! - a FIFO of operations, preserving the order the engine issued them
//! - a membership set of [`EntityKey`]s with a pending tuple write, so the
//!   engine can skip a store read when it already knows a write for that
//!   record is in flight
//!
//! A queue is `OPEN` until [`OperationsQueue::close`] flips it to `CLOSED`,
//! exactly once and terminally. A pre-closed queue
//! ([`OperationsQueue::closed`]) stands in for "no batching" with dialects
//! that write synchronously per call.
//!
//! Dialects that coalesce changes per entity work with
//! [`GroupedChangesToEntityOperation`] groups, produced from a queue by
//! [`coalesce_by_entity`].

mod delegator;

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use gridmap_core::{Association, AssociationKey, EntityKey, Tuple};
use gridmap_options::OptionsContainer;

pub use delegator::BatchingDialect;

/// Errors from the batched write pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed and can accept no further operations.
    #[error("operations queue is closed")]
    Closed,
}

/// One pending write, carrying its target key and write context.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Write a tuple's pending operations under its key.
    InsertOrUpdateTuple {
        /// The record's key.
        key: EntityKey,
        /// The snapshot-plus-diff value to write.
        tuple: Tuple,
        /// Options resolved for the entity at enqueue time.
        options: OptionsContainer,
    },
    /// Remove the record under a key.
    RemoveTuple {
        /// The record's key.
        key: EntityKey,
        /// Options resolved for the entity at enqueue time.
        options: OptionsContainer,
    },
    /// Write an association's pending operations under its key.
    InsertOrUpdateAssociation {
        /// The relationship's key.
        key: AssociationKey,
        /// The snapshot-plus-diff row set to write.
        association: Association,
        /// Options resolved for the association at enqueue time.
        options: OptionsContainer,
    },
    /// Remove the relationship under a key.
    RemoveAssociation {
        /// The relationship's key.
        key: AssociationKey,
        /// Options resolved for the association at enqueue time.
        options: OptionsContainer,
    },
}

impl Operation {
    /// The entity key this operation targets, for tuple operations.
    #[must_use]
    pub const fn entity_key(&self) -> Option<&EntityKey> {
        match self {
            Self::InsertOrUpdateTuple { key, .. } | Self::RemoveTuple { key, .. } => Some(key),
            Self::InsertOrUpdateAssociation { .. } | Self::RemoveAssociation { .. } => None,
        }
    }

    /// The options resolved for this operation at enqueue time.
    #[must_use]
    pub const fn options(&self) -> &OptionsContainer {
        match self {
            Self::InsertOrUpdateTuple { options, .. }
            | Self::RemoveTuple { options, .. }
            | Self::InsertOrUpdateAssociation { options, .. }
            | Self::RemoveAssociation { options, .. } => options,
        }
    }
}

/// FIFO of pending writes for one unit of work.
///
/// Confined to a single unit of work and carrying no locking; see the module
/// docs for the state model.
#[derive(Debug, Default)]
pub struct OperationsQueue {
    operations: VecDeque<Operation>,
    pending_tuple_keys: HashSet<EntityKey>,
    closed: bool,
}

impl OperationsQueue {
    /// Create an open, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that is already closed.
    ///
    /// Stands in for "no batching": every `add` fails with
    /// [`QueueError::Closed`], so callers fall back to writing synchronously.
    #[must_use]
    pub fn closed() -> Self {
        Self { operations: VecDeque::new(), pending_tuple_keys: HashSet::new(), closed: true }
    }

    /// Append an operation.
    ///
    /// Tuple insert-or-update operations also record their entity key in the
    /// membership set consulted by [`contains`](Self::contains).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the queue has been closed.
    pub fn add(&mut self, operation: Operation) -> Result<(), QueueError> {
        if self.closed {
            return Err(QueueError::Closed);
        }
        if let Operation::InsertOrUpdateTuple { key, .. } = &operation {
            self.pending_tuple_keys.insert(key.clone());
        }
        self.operations.push_back(operation);
        Ok(())
    }

    /// Remove and return the oldest operation, or `None` when drained.
    ///
    /// Polling an insert-or-update tuple operation removes the membership
    /// entry for the polled operation's entity key.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the queue has been closed.
    pub fn poll(&mut self) -> Result<Option<Operation>, QueueError> {
        if self.closed {
            return Err(QueueError::Closed);
        }
        let operation = self.operations.pop_front();
        if let Some(Operation::InsertOrUpdateTuple { key, .. }) = &operation {
            self.pending_tuple_keys.remove(key);
        }
        Ok(operation)
    }

    /// Whether a tuple insert-or-update for `key` is currently queued.
    ///
    /// O(1); the mapping engine uses this to skip a store read when a write
    /// for the record is already in flight in this unit of work.
    #[must_use]
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.pending_tuple_keys.contains(key)
    }

    /// Number of queued operations.
    #[must_use]
    pub fn size(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operations are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether the queue has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Iterate over the queued operations without consuming them.
    ///
    /// Observers (such as the compensation collector) use this to record a
    /// batch before a dialect drains it.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Drop all state and close the queue, terminally.
    pub fn close(&mut self) {
        self.operations.clear();
        self.pending_tuple_keys.clear();
        self.closed = true;
    }
}

/// Every queued change for one entity, coalesced for a single native call.
#[derive(Debug)]
pub struct GroupedChangesToEntityOperation {
    key: EntityKey,
    operations: VecDeque<Operation>,
}

impl GroupedChangesToEntityOperation {
    /// Create an empty group for `key`.
    #[must_use]
    pub fn new(key: EntityKey) -> Self {
        Self { key, operations: VecDeque::new() }
    }

    /// Append an operation to this entity's group.
    ///
    /// # Panics
    ///
    /// Panics if the operation targets a different entity; mixing keys in
    /// one group is a programming error.
    pub fn push(&mut self, operation: Operation) {
        assert_eq!(
            operation.entity_key(),
            Some(&self.key),
            "grouped operation must target the group's entity key"
        );
        self.operations.push_back(operation);
    }

    /// The entity all grouped operations target.
    #[inline]
    #[must_use]
    pub const fn entity_key(&self) -> &EntityKey {
        &self.key
    }

    /// The grouped operations, oldest first.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Number of grouped operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Consume the group, yielding its operations oldest first.
    #[must_use]
    pub fn into_operations(self) -> VecDeque<Operation> {
        self.operations
    }
}

/// A queue entry after per-entity coalescing: either one entity's group or a
/// single operation with no entity key to group under.
#[derive(Debug)]
pub enum EntityBatch {
    /// All changes for one entity, in issue order.
    Grouped(GroupedChangesToEntityOperation),
    /// An operation left in place (association writes).
    Ungrouped(Operation),
}

/// Drain a queue, coalescing tuple operations per entity.
///
/// Each entity's group sits at the queue position of that entity's first
/// operation; operations without an entity key keep their own position.
/// Relative order within a group is the order the engine issued the writes.
///
/// # Errors
///
/// Returns [`QueueError::Closed`] if the queue has been closed.
pub fn coalesce_by_entity(queue: &mut OperationsQueue) -> Result<Vec<EntityBatch>, QueueError> {
    let mut batches: Vec<EntityBatch> = Vec::new();
    let mut group_index: HashMap<EntityKey, usize> = HashMap::new();

    while let Some(operation) = queue.poll()? {
        let Some(key) = operation.entity_key().cloned() else {
            batches.push(EntityBatch::Ungrouped(operation));
            continue;
        };
        if let Some(&at) = group_index.get(&key) {
            if let EntityBatch::Grouped(group) = &mut batches[at] {
                group.push(operation);
            }
        } else {
            group_index.insert(key.clone(), batches.len());
            let mut group = GroupedChangesToEntityOperation::new(key);
            group.push(operation);
            batches.push(EntityBatch::Grouped(group));
        }
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use gridmap_core::{AssociationKeyMetadata, EntityKeyMetadata, Value};

    use super::*;

    fn key(id: i64) -> EntityKey {
        EntityKey::new(EntityKeyMetadata::new("User", ["id"]), vec![Value::Int(id)])
    }

    fn insert_op(id: i64) -> Operation {
        let mut tuple = Tuple::new();
        tuple.put("id", id);
        Operation::InsertOrUpdateTuple {
            key: key(id),
            tuple,
            options: OptionsContainer::empty(),
        }
    }

    fn remove_op(id: i64) -> Operation {
        Operation::RemoveTuple { key: key(id), options: OptionsContainer::empty() }
    }

    fn association_op() -> Operation {
        let akey = AssociationKey::new(
            AssociationKeyMetadata::new("User_Address", ["user_id"]),
            vec![Value::Int(1)],
        );
        Operation::InsertOrUpdateAssociation {
            key: akey,
            association: Association::new(),
            options: OptionsContainer::empty(),
        }
    }

    #[test]
    fn add_then_poll_roundtrip() {
        let mut queue = OperationsQueue::new();
        queue.add(insert_op(1)).expect("queue is open");

        assert_eq!(queue.size(), 1);
        assert!(queue.contains(&key(1)));

        let polled = queue.poll().expect("queue is open").expect("one operation queued");
        assert!(matches!(polled, Operation::InsertOrUpdateTuple { .. }));
        assert_eq!(queue.size(), 0);
        assert!(!queue.contains(&key(1)));
    }

    #[test]
    fn poll_is_fifo() {
        let mut queue = OperationsQueue::new();
        queue.add(insert_op(1)).expect("open");
        queue.add(remove_op(2)).expect("open");
        queue.add(insert_op(3)).expect("open");

        let first = queue.poll().expect("open").expect("queued");
        assert_eq!(first.entity_key(), Some(&key(1)));
        let second = queue.poll().expect("open").expect("queued");
        assert_eq!(second.entity_key(), Some(&key(2)));
        let third = queue.poll().expect("open").expect("queued");
        assert_eq!(third.entity_key(), Some(&key(3)));
        assert!(queue.poll().expect("open").is_none());
    }

    #[test]
    fn membership_is_removed_by_entity_key_not_operation_identity() {
        let mut queue = OperationsQueue::new();
        // Two distinct operation values for the same entity key
        queue.add(insert_op(1)).expect("open");
        let mut tuple = Tuple::new();
        tuple.put("name", "other");
        queue
            .add(Operation::InsertOrUpdateTuple {
                key: key(1),
                tuple,
                options: OptionsContainer::empty(),
            })
            .expect("open");

        assert!(queue.contains(&key(1)));
        let _ = queue.poll().expect("open");
        // The polled operation's key is what leaves the membership set.
        assert!(!queue.contains(&key(1)));
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn remove_tuple_does_not_join_membership() {
        let mut queue = OperationsQueue::new();
        queue.add(remove_op(1)).expect("open");
        assert!(!queue.contains(&key(1)));
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn close_is_terminal() {
        let mut queue = OperationsQueue::new();
        queue.add(insert_op(1)).expect("open");
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.add(insert_op(2)), Err(QueueError::Closed));
        assert!(matches!(queue.poll(), Err(QueueError::Closed)));
    }

    #[test]
    fn closed_constructor_rejects_everything() {
        let mut queue = OperationsQueue::closed();
        assert!(queue.is_closed());
        assert_eq!(queue.add(insert_op(1)), Err(QueueError::Closed));
    }

    #[test]
    fn coalesce_groups_per_entity_in_first_seen_order() {
        let mut queue = OperationsQueue::new();
        queue.add(insert_op(1)).expect("open");
        queue.add(insert_op(2)).expect("open");
        queue.add(association_op()).expect("open");
        queue.add(remove_op(1)).expect("open");

        let batches = coalesce_by_entity(&mut queue).expect("open");
        assert_eq!(batches.len(), 3);

        match &batches[0] {
            EntityBatch::Grouped(group) => {
                assert_eq!(group.entity_key(), &key(1));
                assert_eq!(group.len(), 2);
                let kinds: Vec<_> = group.operations().collect();
                assert!(matches!(kinds[0], Operation::InsertOrUpdateTuple { .. }));
                assert!(matches!(kinds[1], Operation::RemoveTuple { .. }));
            }
            EntityBatch::Ungrouped(_) => panic!("expected a group for entity 1"),
        }
        match &batches[1] {
            EntityBatch::Grouped(group) => assert_eq!(group.entity_key(), &key(2)),
            EntityBatch::Ungrouped(_) => panic!("expected a group for entity 2"),
        }
        assert!(matches!(&batches[2], EntityBatch::Ungrouped(_)));
        assert!(queue.is_empty());
    }

    #[test]
    #[should_panic(expected = "grouped operation must target the group's entity key")]
    fn grouping_under_the_wrong_key_panics() {
        let mut group = GroupedChangesToEntityOperation::new(key(1));
        group.push(insert_op(2));
    }
}
