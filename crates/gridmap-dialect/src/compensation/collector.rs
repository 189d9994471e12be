//! Invocation collection for compensation and audit.
//!
//! [`CollectingDialect`] wraps another dialect and records every write it
//! forwards as a [`GridDialectOperation`] in an [`OperationCollector`]. The
//! wrapped dialect stays the one doing the work; the collector only observes
//! outcomes: applied writes, stale optimistic writes, and failures with the
//! record of what was being attempted.
//!
//! Reads are forwarded unrecorded - the log describes write intents, not
//! traffic.

use gridmap_core::{Association, AssociationKey, EntityKey, Tuple, TupleSnapshot};
use gridmap_query::{BackendQuery, ParameterMetadataBuilder, QueryParameters};

use crate::batch::OperationsQueue;
use crate::compensation::{
    CreateAssociation, CreateTuple, ExecuteBatch, FlushPendingOperations, GridDialectOperation,
    InsertOrUpdateAssociation, InsertOrUpdateTuple, RemoveAssociation, RemoveTuple,
    RemoveTupleWithOptimisticLock, UpdateTupleWithOptimisticLock,
};
use crate::spi::{
    AssociationContext, BatchableDialect, CasOutcome, DialectError, DialectResult, GridDialect,
    GroupingByEntityDialect, OptimisticLockingDialect, QueryableDialect, TupleContext,
};

/// A write that failed, with the record of what was being attempted.
#[derive(Debug, Clone)]
pub struct FailedOperation {
    /// The attempted operation.
    pub operation: GridDialectOperation,
    /// The rendered dialect error.
    pub error: String,
}

/// Accumulates the operation records produced during one recording window.
#[derive(Debug, Default)]
pub struct OperationCollector {
    applied: Vec<GridDialectOperation>,
    stale: Vec<GridDialectOperation>,
    failed: Vec<FailedOperation>,
}

impl OperationCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully applied operation.
    pub fn record_applied(&mut self, operation: GridDialectOperation) {
        self.applied.push(operation);
    }

    /// Record an optimistic write rejected for a stale pre-image.
    pub fn record_stale(&mut self, operation: GridDialectOperation) {
        self.stale.push(operation);
    }

    /// Record a failed operation.
    pub fn record_failure(&mut self, operation: GridDialectOperation, error: &DialectError) {
        self.failed.push(FailedOperation { operation, error: error.to_string() });
    }

    /// The applied operations, in application order.
    #[must_use]
    pub fn applied(&self) -> &[GridDialectOperation] {
        &self.applied
    }

    /// The stale optimistic attempts, in attempt order.
    #[must_use]
    pub fn stale(&self) -> &[GridDialectOperation] {
        &self.stale
    }

    /// The failed operations, in attempt order.
    #[must_use]
    pub fn failed(&self) -> &[FailedOperation] {
        &self.failed
    }
}

/// Wraps a dialect, recording every write intent it forwards.
#[derive(Debug)]
pub struct CollectingDialect<D> {
    inner: D,
    collector: OperationCollector,
}

impl<D> CollectingDialect<D> {
    /// Wrap `inner` with a fresh collector.
    #[must_use]
    pub fn new(inner: D) -> Self {
        Self { inner, collector: OperationCollector::new() }
    }

    /// The recorded operations so far.
    #[must_use]
    pub const fn collector(&self) -> &OperationCollector {
        &self.collector
    }

    /// The wrapped dialect.
    #[must_use]
    pub const fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwrap, yielding the collector with its records.
    #[must_use]
    pub fn into_collector(self) -> OperationCollector {
        self.collector
    }

    /// Forwards a write, filing the record under applied or failed.
    fn observe<T>(
        &mut self,
        record: GridDialectOperation,
        result: DialectResult<T>,
    ) -> DialectResult<T> {
        match result {
            Ok(value) => {
                self.collector.record_applied(record);
                Ok(value)
            }
            Err(error) => {
                tracing::debug!(operation = ?record.kind(), %error, "recording failed operation");
                self.collector.record_failure(record, &error);
                Err(error)
            }
        }
    }

    /// Forwards an optimistic write, filing the record by its outcome.
    fn observe_cas(
        &mut self,
        record: GridDialectOperation,
        result: DialectResult<CasOutcome>,
    ) -> DialectResult<CasOutcome> {
        match result {
            Ok(CasOutcome::Applied) => {
                self.collector.record_applied(record);
                Ok(CasOutcome::Applied)
            }
            Ok(CasOutcome::StaleState) => {
                self.collector.record_stale(record);
                Ok(CasOutcome::StaleState)
            }
            Err(error) => {
                self.collector.record_failure(record, &error);
                Err(error)
            }
        }
    }
}

impl<D: GridDialect> GridDialect for CollectingDialect<D> {
    fn get_tuple(&self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<Option<Tuple>> {
        self.inner.get_tuple(key, ctx)
    }

    fn create_tuple(&mut self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<Tuple> {
        let record = GridDialectOperation::CreateTuple(CreateTuple { key: key.clone() });
        let result = self.inner.create_tuple(key, ctx);
        self.observe(record, result)
    }

    fn insert_or_update_tuple(
        &mut self,
        key: &EntityKey,
        tuple: &Tuple,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<()> {
        let record = GridDialectOperation::InsertOrUpdateTuple(InsertOrUpdateTuple {
            key: key.clone(),
            tuple: tuple.clone(),
        });
        let result = self.inner.insert_or_update_tuple(key, tuple, ctx);
        self.observe(record, result)
    }

    fn remove_tuple(&mut self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<()> {
        let record = GridDialectOperation::RemoveTuple(RemoveTuple { key: key.clone() });
        let result = self.inner.remove_tuple(key, ctx);
        self.observe(record, result)
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<Option<Association>> {
        self.inner.get_association(key, ctx)
    }

    fn create_association(
        &mut self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<Association> {
        let record =
            GridDialectOperation::CreateAssociation(CreateAssociation { key: key.clone() });
        let result = self.inner.create_association(key, ctx);
        self.observe(record, result)
    }

    fn insert_or_update_association(
        &mut self,
        key: &AssociationKey,
        association: &Association,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<()> {
        let record = GridDialectOperation::InsertOrUpdateAssociation(InsertOrUpdateAssociation {
            key: key.clone(),
            association: association.clone(),
        });
        let result = self.inner.insert_or_update_association(key, association, ctx);
        self.observe(record, result)
    }

    fn remove_association(
        &mut self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<()> {
        let record =
            GridDialectOperation::RemoveAssociation(RemoveAssociation { key: key.clone() });
        let result = self.inner.remove_association(key, ctx);
        self.observe(record, result)
    }
}

impl<D: BatchableDialect> BatchableDialect for CollectingDialect<D> {
    fn execute_batch(&mut self, queue: &mut OperationsQueue) -> DialectResult<()> {
        // Snapshot the batch before the inner dialect drains it.
        let operations: Vec<GridDialectOperation> =
            queue.operations().map(GridDialectOperation::from).collect();
        let record = GridDialectOperation::ExecuteBatch(ExecuteBatch { operations });

        let result = self.inner.execute_batch(queue);
        self.observe(record, result)
    }
}

impl<D: GroupingByEntityDialect> GroupingByEntityDialect for CollectingDialect<D> {
    fn flush_pending_operations(
        &mut self,
        key: &EntityKey,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<()> {
        // The flushed group is whatever the pending queue holds for the key;
        // without a queue in the context there is nothing to snapshot.
        let operations: Vec<GridDialectOperation> = ctx
            .operations_queue()
            .map(|queue| {
                queue
                    .operations()
                    .filter(|op| op.entity_key() == Some(key))
                    .map(GridDialectOperation::from)
                    .collect()
            })
            .unwrap_or_default();
        let record = GridDialectOperation::FlushPendingOperations(FlushPendingOperations {
            key: key.clone(),
            operations,
        });

        let result = self.inner.flush_pending_operations(key, ctx);
        self.observe(record, result)
    }
}

impl<D: OptimisticLockingDialect> OptimisticLockingDialect for CollectingDialect<D> {
    fn update_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        new_tuple: &Tuple,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome> {
        let record = GridDialectOperation::UpdateTupleWithOptimisticLock(
            UpdateTupleWithOptimisticLock {
                key: key.clone(),
                old_lock_state: old_lock_state.clone(),
                new_tuple: new_tuple.clone(),
            },
        );
        let result =
            self.inner.update_tuple_with_optimistic_lock(key, old_lock_state, new_tuple, ctx);
        self.observe_cas(record, result)
    }

    fn remove_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome> {
        let record = GridDialectOperation::RemoveTupleWithOptimisticLock(
            RemoveTupleWithOptimisticLock {
                key: key.clone(),
                old_lock_state: old_lock_state.clone(),
            },
        );
        let result = self.inner.remove_tuple_with_optimistic_lock(key, old_lock_state, ctx);
        self.observe_cas(record, result)
    }
}

impl<D: QueryableDialect> QueryableDialect for CollectingDialect<D> {
    type NativeQuery = D::NativeQuery;

    fn execute_backend_query(
        &self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<Vec<Tuple>> {
        self.inner.execute_backend_query(query, params, ctx)
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
