//! The dialect SPI: the capability set store plugins implement.
//!
//! This module defines the traits through which the core talks to a store:
//!
//! - [`GridDialect`] - base CRUD over tuples and associations; every dialect
//!   implements this
//! - [`BatchableDialect`] - executes a whole [`OperationsQueue`] in one
//!   native round trip
//! - [`GroupingByEntityDialect`] - batches *and* coalesces queued operations
//!   per entity, with early per-entity flushing
//! - [`OptimisticLockingDialect`] - per-record compare-and-swap for stores
//!   without native multi-record transactions
//! - [`QueryableDialect`] - executes store-native queries
//!
//! Capabilities are independent traits, not an inheritance ladder: a dialect
//! opts into exactly the facets its store supports, and the host selects
//! behavior per facet at configuration time.
//!
//! The core defines these contracts and performs no I/O itself; everything
//! physical happens behind a dialect implementation. The reference
//! implementation lives in [`backends::mem`](crate::backends::mem).

mod error;

use gridmap_core::{Association, AssociationKey, EntityKey, Tuple, TupleSnapshot};
use gridmap_options::OptionsContainer;
use gridmap_query::{BackendQuery, ParameterMetadataBuilder, QueryParameters};

use crate::batch::OperationsQueue;

pub use error::{DialectError, DialectResult};

/// The outcome of an optimistic compare-and-swap write.
///
/// A stale write is an expected outcome, handled by retrying at a higher
/// level - not an error. Returning it as a dedicated type (rather than a
/// boolean) makes it impossible to apply-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a stale CAS outcome must be handled, typically by retrying the unit of work"]
pub enum CasOutcome {
    /// The store's state matched the expected pre-image and the write was
    /// applied atomically.
    Applied,
    /// The store's state no longer matched the expected pre-image; nothing
    /// was written.
    StaleState,
}

impl CasOutcome {
    /// Whether the write was applied.
    #[inline]
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Whether the write was rejected because the pre-image was stale.
    #[inline]
    #[must_use]
    pub const fn is_stale(self) -> bool {
        matches!(self, Self::StaleState)
    }
}

/// Per-call context for tuple operations.
///
/// Carries the options resolved for the entity being written and, when a
/// batching layer is active, a handle to the pending operations queue so the
/// dialect can account for writes that are queued but not yet in the store.
#[derive(Debug, Clone, Copy)]
pub struct TupleContext<'a> {
    options: &'a OptionsContainer,
    operations_queue: Option<&'a OperationsQueue>,
}

impl<'a> TupleContext<'a> {
    /// Create a context carrying the given options and no queue.
    #[must_use]
    pub const fn new(options: &'a OptionsContainer) -> Self {
        Self { options, operations_queue: None }
    }

    /// Attach the pending operations queue.
    #[must_use]
    pub const fn with_queue(mut self, queue: &'a OperationsQueue) -> Self {
        self.operations_queue = Some(queue);
        self
    }

    /// The options resolved for the entity being accessed.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &'a OptionsContainer {
        self.options
    }

    /// The pending operations queue, when a batching layer is active.
    #[inline]
    #[must_use]
    pub const fn operations_queue(&self) -> Option<&'a OperationsQueue> {
        self.operations_queue
    }
}

/// Per-call context for association operations.
#[derive(Debug, Clone, Copy)]
pub struct AssociationContext<'a> {
    options: &'a OptionsContainer,
    operations_queue: Option<&'a OperationsQueue>,
}

impl<'a> AssociationContext<'a> {
    /// Create a context carrying the given options and no queue.
    #[must_use]
    pub const fn new(options: &'a OptionsContainer) -> Self {
        Self { options, operations_queue: None }
    }

    /// Attach the pending operations queue.
    #[must_use]
    pub const fn with_queue(mut self, queue: &'a OperationsQueue) -> Self {
        self.operations_queue = Some(queue);
        self
    }

    /// The options resolved for the association being accessed.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &'a OptionsContainer {
        self.options
    }

    /// The pending operations queue, when a batching layer is active.
    #[inline]
    #[must_use]
    pub const fn operations_queue(&self) -> Option<&'a OperationsQueue> {
        self.operations_queue
    }
}

/// Base CRUD contract every store dialect implements.
///
/// All methods are synchronous and confined to one unit of work at a time;
/// dialects carry no locking obligations of their own. Writes receive the
/// full snapshot-plus-diff value and decide themselves whether to apply the
/// operation log incrementally or replay it onto a full rewrite.
pub trait GridDialect {
    /// Load the tuple stored under `key`, or `None` if the store has no such
    /// record.
    fn get_tuple(&self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<Option<Tuple>>;

    /// Produce a fresh tuple for a record about to be created under `key`.
    ///
    /// The record is not persisted until the tuple is handed to
    /// [`insert_or_update_tuple`](Self::insert_or_update_tuple). Dialects
    /// whose stores seed server-generated columns override this.
    fn create_tuple(&mut self, _key: &EntityKey, _ctx: &TupleContext<'_>) -> DialectResult<Tuple> {
        Ok(Tuple::new())
    }

    /// Write the tuple's pending operations to the store under `key`.
    fn insert_or_update_tuple(
        &mut self,
        key: &EntityKey,
        tuple: &Tuple,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<()>;

    /// Remove the record stored under `key`.
    fn remove_tuple(&mut self, key: &EntityKey, ctx: &TupleContext<'_>) -> DialectResult<()>;

    /// Load the association stored under `key`, or `None` if the store has
    /// no such relationship.
    fn get_association(
        &self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<Option<Association>>;

    /// Produce a fresh association for a relationship about to be created
    /// under `key`.
    fn create_association(
        &mut self,
        _key: &AssociationKey,
        _ctx: &AssociationContext<'_>,
    ) -> DialectResult<Association> {
        Ok(Association::new())
    }

    /// Write the association's pending operations to the store under `key`.
    fn insert_or_update_association(
        &mut self,
        key: &AssociationKey,
        association: &Association,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<()>;

    /// Remove the relationship stored under `key`.
    fn remove_association(
        &mut self,
        key: &AssociationKey,
        ctx: &AssociationContext<'_>,
    ) -> DialectResult<()>;
}

/// Facet for dialects that execute a queue of writes in one batch.
///
/// `execute_batch` drains the queue and runs to completion or raises an
/// error. A failure aborts the remaining queue; the pipeline defines no
/// partial-rollback semantics, so whatever was applied before the failure
/// stays applied. Closing that gap is up to the store or a compensation
/// layer above.
pub trait BatchableDialect: GridDialect {
    /// Drain `queue` and apply every operation against the store.
    fn execute_batch(&mut self, queue: &mut OperationsQueue) -> DialectResult<()>;
}

/// Facet for dialects that coalesce queued changes per entity.
///
/// On top of batch execution, a grouping dialect folds every queued change
/// for one entity into a single native call (see
/// [`coalesce_by_entity`](crate::batch::coalesce_by_entity)) and can flush a
/// single entity's pending group early - typically just before a read of
/// that same record inside the unit of work.
pub trait GroupingByEntityDialect: BatchableDialect {
    /// Force an early flush of the pending changes for one entity.
    fn flush_pending_operations(
        &mut self,
        key: &EntityKey,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<()>;
}

/// Facet for dialects that support per-record compare-and-swap writes.
///
/// This is the only cross-unit-of-work coordination primitive in the model:
/// stores without native multi-record transactions rely on it for
/// concurrent-modification detection. `old_lock_state` is the snapshot
/// observed when the record was read (carrying a version or revision
/// column); a conforming dialect applies the write only if the store's
/// current state for the key still matches it, atomically with respect to
/// concurrent writers.
pub trait OptimisticLockingDialect: GridDialect {
    /// Replace the record under `key` with `new_tuple`, if and only if the
    /// store still holds `old_lock_state`.
    fn update_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        new_tuple: &Tuple,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome>;

    /// Remove the record under `key`, if and only if the store still holds
    /// `old_lock_state`.
    fn remove_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome>;
}

/// Facet for dialects that execute store-native queries.
pub trait QueryableDialect: GridDialect {
    /// The store-native query representation.
    type NativeQuery;

    /// Execute a read query, returning the matching tuples with the
    /// parameters' row selection applied.
    fn execute_backend_query(
        &self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<Vec<Tuple>>;

    /// Execute an update query, returning the number of affected records.
    fn execute_backend_update_query(
        &mut self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        ctx: &TupleContext<'_>,
    ) -> DialectResult<u64>;

    /// The placeholder-discovery strategy for this store's native queries.
    fn parameter_metadata_builder(&self) -> Box<dyn ParameterMetadataBuilder>;

    /// Parse a native query string into this store's query representation.
    fn parse_native_query(&self, native_query: &str) -> DialectResult<Self::NativeQuery>;
}
