//! Write interception for batching dialects.
//!
//! [`BatchingDialect`] wraps another dialect and populates the operations
//! queue the wrapped dialect will drain: writes are intercepted and enqueued
//! while batching is on, reads are forwarded with the queue attached to the
//! call context so the store can account for queued-but-unwritten records.
//! With batching off (a closed queue), every call passes straight through.
//!
//! The wrapper forwards every other facet of the inner dialect unchanged -
//! optimistic CAS writes in particular are never queued, since their whole
//! point is to race concurrent writers at the store.

use gridmap_core::{Association, AssociationKey, EntityKey, Tuple, TupleSnapshot};
use gridmap_query::{BackendQuery, ParameterMetadataBuilder, QueryParameters};

use crate::batch::{Operation, OperationsQueue};
use crate::spi::{
    AssociationContext, BatchableDialect, CasOutcome, DialectResult, GridDialect,
    GroupingByEntityDialect, OptimisticLockingDialect, QueryableDialect, TupleContext,
};

/// Wraps a dialect, queueing its writes for batched execution.
#[derive(Debug)]
pub struct BatchingDialect<D> {
    inner: D,
    queue: OperationsQueue,
}

impl<D> BatchingDialect<D> {
    /// Wrap `inner` with batching on: writes are queued until
    /// [`flush`](Self::flush).
    #[must_use]
    pub fn new(inner: D) -> Self {
        Self { inner, queue: OperationsQueue::new() }
    }

    /// Wrap `inner` with batching off: writes pass straight through.
    #[must_use]
    pub fn passthrough(inner: D) -> Self {
        Self { inner, queue: OperationsQueue::closed() }
    }

    /// The pending queue.
    #[must_use]
    pub const fn queue(&self) -> &OperationsQueue {
        &self.queue
    }

    /// The wrapped dialect.
    #[must_use]
    pub const fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwrap, discarding any pending operations.
    #[must_use]
    pub fn into_inner(self) -> D {
        self.inner
    }

    /// Close the queue at the end of the unit of work; pending operations
    /// are dropped and later writes fail with a queue-closed error.
    pub fn close(&mut self) {
        self.queue.close();
    }

    const fn is_batching(&self) -> bool {
        !self.queue.is_closed()
    }
}

impl<D: BatchableDialect> BatchingDialect<D> {
    /// Hand the accumulated queue to the inner dialect for batch execution.
    ///
    /// The queue is replaced by a fresh open one, so the unit of work can
    /// keep writing after a flush. With batching off this is a no-op.
    pub fn flush(&mut self) -> DialectResult<()> {
        if !self.is_batching() {
            return Ok(());
        }
        tracing::debug!(operations = self.queue.size(), "executing batch");
        let mut queue = std::mem::take(&mut self.queue);
        self.inner.execute_batch(&mut queue)
    }
}

impl<D: GridDialect> GridDialect for BatchingDialect<D> {
    fn get_tuple(&self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<Option<Tuple>> {
        self.inner.get_tuple(key, &ctx.with_queue(&self.queue))
    }

    fn create_tuple(&mut self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<Tuple> {
        self.inner.create_tuple(key, &ctx.with_queue(&self.queue))
    }

    fn insert_or_update_tuple(
        &mut self,
        key: &EntityKey,
        tuple: &Tuple,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<()> {
        if self.is_batching() {
            self.queue.add(Operation::InsertOrUpdateTuple {
                key: key.clone(),
                tuple: tuple.clone(),
                options: ctx.options().clone(),
            })?;
            Ok(())
        } else {
            self.inner.insert_or_update_tuple(key, tuple, ctx)
        }
    }

    fn remove_tuple(&mut self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<()> {
        if self.is_batching() {
            self.queue
                .add(Operation::RemoveTuple { key: key.clone(), options: ctx.options().clone() })?;
            Ok(())
        } else {
            self.inner.remove_tuple(key, ctx)
        }
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<Option<Association>> {
        self.inner.get_association(key, &ctx.with_queue(&self.queue))
    }

    fn create_association(
        &mut self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<Association> {
        self.inner.create_association(key, &ctx.with_queue(&self.queue))
    }

    fn insert_or_update_association(
        &mut self,
        key: &AssociationKey,
        association: &Association,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<()> {
        if self.is_batching() {
            self.queue.add(Operation::InsertOrUpdateAssociation {
                key: key.clone(),
                association: association.clone(),
                options: ctx.options().clone(),
            })?;
            Ok(())
        } else {
            self.inner.insert_or_update_association(key, association, ctx)
        }
    }

    fn remove_association(
        &mut self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<()> {
        if self.is_batching() {
            self.queue.add(Operation::RemoveAssociation {
                key: key.clone(),
                options: ctx.options().clone(),
            })?;
            Ok(())
        } else {
            self.inner.remove_association(key, ctx)
        }
    }
}

impl<D: BatchableDialect> BatchableDialect for BatchingDialect<D> {
    fn execute_batch(&mut self, queue: &mut OperationsQueue) -> DialectResult<()> {
        self.inner.execute_batch(queue)
    }
}

impl<D: GroupingByEntityDialect> GroupingByEntityDialect for BatchingDialect<D> {
    fn flush_pending_operations(
        &mut self,
        key: &EntityKey,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<()> {
        self.inner.flush_pending_operations(key, ctx)
    }
}

impl<D: OptimisticLockingDialect> OptimisticLockingDialect for BatchingDialect<D> {
    fn update_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        new_tuple: &Tuple,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome> {
        self.inner.update_tuple_with_optimistic_lock(key, old_lock_state, new_tuple, ctx)
    }

    fn remove_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome> {
        self.inner.remove_tuple_with_optimistic_lock(key, old_lock_state, ctx)
    }
}

impl<D: QueryableDialect> QueryableDialect for BatchingDialect<D> {
    type NativeQuery = D::NativeQuery;

    fn execute_backend_query(
        &self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<Vec<Tuple>> {
        self.inner.execute_backend_query(query, params, &ctx.with_queue(&self.queue))
    }

    fn execute_backend_update_query(
        &mut self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<u64> {
        self.inner.execute_backend_update_query(query, params, ctx)
    }

    fn parameter_metadata_builder(&self) -> Box<dyn ParameterMetadataBuilder> {
        self.inner.parameter_metadata_builder()
    }

    fn parse_native_query(&self, native_query: &str) -> DialectResult<Self::NativeQuery> {
        self.inner.parse_native_query(native_query)
    }
}
