//! In-memory reference backend.
//!
//! [`MemoryDialect`] keeps every record in process-local hash maps and
//! implements the full capability set: base CRUD, batch execution with
//! per-entity grouping, optimistic CAS, and structured native queries. It is
//! the conformance reference the test suites run against, and a usable
//! backend for tests of code built on top of the SPI.
//!
//! Writes are applied *incrementally*: the dialect replays each value's
//! pending operation log onto the stored state, the way a document store
//! would translate the log into native `$set`/`$unset` calls. No-op unsets
//! (removing a column that was never written) are tolerated, as the contract
//! requires.
//!
//! # Native queries
//!
//! The native query representation is [`MemoryQuery`], a pre-structured
//! object - so the dialect's parameter discovery is the no-op builder, and
//! query strings are parsed as JSON:
//!
//! ```json
//! { "table": "User", "criteria": [ { "column": "name", "equals": { "param": "name" } } ] }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gridmap_core::{
    Association, AssociationKey, AssociationOperation, AssociationSnapshot, EntityKey, RowKey,
    Tuple, TupleOperation, TupleSnapshot, Value,
};
use gridmap_query::{
    BackendQuery, NoopParameterMetadataBuilder, ParameterMetadataBuilder, QueryParameters,
};

use crate::batch::{coalesce_by_entity, EntityBatch, Operation, OperationsQueue};
use crate::spi::{
    AssociationContext, BatchableDialect, CasOutcome, DialectError, DialectResult, GridDialect,
    GroupingByEntityDialect, OptimisticLockingDialect, QueryableDialect, TupleContext,
};

/// One stored record: a plain column map.
type StoredTuple = HashMap<String, Value>;

/// One stored relationship: row maps keyed by row key.
type StoredAssociation = HashMap<RowKey, StoredTuple>;

/// A value in a [`MemoryQuery`] criterion or assignment: either a literal or
/// a reference to a named parameter bound at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A named-parameter reference, resolved from the bound parameters.
    Parameter {
        /// The parameter name.
        param: String,
    },
    /// A literal value.
    Literal(Value),
}

/// One equality criterion of a [`MemoryQuery`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// The column to compare.
    pub column: String,
    /// The value the column must equal.
    pub equals: QueryValue,
}

/// One assignment of a [`MemoryQuery`] update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// The column to set.
    pub column: String,
    /// The value to store.
    pub value: QueryValue,
}

/// The memory backend's pre-structured native query.
///
/// A read query selects the records of `table` matching every criterion. An
/// update query additionally applies `assignments` to the matches; an update
/// with no assignments removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// The table to query.
    pub table: String,
    /// Equality criteria, all of which must match.
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    /// Assignments applied by update queries.
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

/// Hash-map-backed dialect implementing the full capability set.
#[derive(Debug, Default)]
pub struct MemoryDialect {
    tuples: HashMap<EntityKey, StoredTuple>,
    associations: HashMap<AssociationKey, StoredAssociation>,
}

impl MemoryDialect {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn tuple_count(&self) -> usize {
        self.tuples.len()
    }

    /// Number of stored relationships.
    #[must_use]
    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    /// Replays a tuple's pending operation log onto stored columns.
    fn apply_tuple_operations(stored: &mut StoredTuple, tuple: &Tuple) {
        for op in tuple.operations() {
            match op {
                TupleOperation::Put { column, value } => {
                    stored.insert(column.clone(), value.clone());
                }
                TupleOperation::PutNull { column } => {
                    stored.insert(column.clone(), Value::Null);
                }
                TupleOperation::Remove { column } => {
                    stored.remove(column);
                }
            }
        }
    }

    /// Renders a row tuple's merged view as stored columns.
    fn materialize_row(row: &Tuple) -> StoredTuple {
        let mut stored = StoredTuple::new();
        for column in row.column_names() {
            if let Some(value) = row.get(column) {
                stored.insert(column.to_owned(), value.clone());
            }
        }
        stored
    }

    /// Whether the stored state for a key still matches an optimistic
    /// pre-image. A missing record never matches: the CAS contract guards
    /// existing, versioned records.
    fn matches_lock_state(stored: Option<&StoredTuple>, old_lock_state: &TupleSnapshot) -> bool {
        let Some(columns) = stored else {
            return false;
        };
        old_lock_state.len() == columns.len()
            && old_lock_state
                .column_names()
                .all(|name| columns.get(name) == old_lock_state.get(name))
    }

    /// Resolves a query value against the bound parameters.
    fn resolve(value: &QueryValue, params: &QueryParameters) -> DialectResult<Value> {
        match value {
            QueryValue::Literal(value) => Ok(value.clone()),
            QueryValue::Parameter { param } => params
                .parameter(param)
                .map(|typed| typed.value().clone())
                .ok_or_else(|| DialectError::Query(format!("unbound parameter `{param}`"))),
        }
    }

    /// The keys of stored records matching a query, ordered by key for
    /// deterministic results.
    fn matching_keys(
        &self,
        query: &MemoryQuery,
        params: &QueryParameters,
    ) -> DialectResult<Vec<EntityKey>> {
        let mut criteria = Vec::with_capacity(query.criteria.len());
        for criterion in &query.criteria {
            criteria.push((criterion.column.as_str(), Self::resolve(&criterion.equals, params)?));
        }

        let mut keys: Vec<EntityKey> = self
            .tuples
            .iter()
            .filter(|(key, columns)| {
                key.table() == query.table
                    && criteria.iter().all(|(column, value)| columns.get(*column) == Some(value))
            })
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by_key(ToString::to_string);
        Ok(keys)
    }
}

impl GridDialect for MemoryDialect {
    fn get_tuple(&self, key: &EntityKey, _ctx: &TupleContext<'_>) -> DialectResult<Option<Tuple>> {
        Ok(self
            .tuples
            .get(key)
            .map(|columns| Tuple::from_snapshot(TupleSnapshot::new(columns.clone()))))
    }

    fn insert_or_update_tuple(
        &mut self,
        key: &EntityKey,
        tuple: &Tuple,
        _ctx: &TupleContext<'_>,
    ) -> DialectResult<()> {
        let stored = self.tuples.entry(key.clone()).or_default();
        Self::apply_tuple_operations(stored, tuple);
        Ok(())
    }

    fn remove_tuple(&mut self, key: &EntityKey, _ctx: &TupleContext<'_>) -> DialectResult<()> {
        self.tuples.remove(key);
        Ok(())
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        _ctx: &AssociationContext<'_>,
    ) -> DialectResult<Option<Association>> {
        Ok(self.associations.get(key).map(|rows| {
            let snapshot: AssociationSnapshot = rows
                .iter()
                .map(|(row_key, columns)| {
                    (row_key.clone(), Tuple::from_snapshot(TupleSnapshot::new(columns.clone())))
                })
                .collect();
            Association::from_snapshot(snapshot)
        }))
    }

    fn insert_or_update_association(
        &mut self,
        key: &AssociationKey,
        association: &Association,
        _ctx: &AssociationContext<'_>,
    ) -> DialectResult<()> {
        let stored = self.associations.entry(key.clone()).or_default();
        for op in association.operations() {
            match op {
                AssociationOperation::Put { row_key, row } => {
                    stored.insert(row_key.clone(), Self::materialize_row(row));
                }
                AssociationOperation::PutNull { row_key } => {
                    stored.insert(row_key.clone(), StoredTuple::new());
                }
                AssociationOperation::Remove { row_key } => {
                    stored.remove(row_key);
                }
                AssociationOperation::Clear => stored.clear(),
            }
        }
        Ok(())
    }

    fn remove_association(
        &mut self,
        key: &AssociationKey,
        _ctx: &AssociationContext<'_>,
    ) -> DialectResult<()> {
        self.associations.remove(key);
        Ok(())
    }
}

impl BatchableDialect for MemoryDialect {
    fn execute_batch(&mut self, queue: &mut OperationsQueue) -> DialectResult<()> {
        tracing::debug!(operations = queue.size(), "executing batch against memory store");
        let options = gridmap_options::OptionsContainer::empty();
        for batch in coalesce_by_entity(queue)? {
            match batch {
                EntityBatch::Grouped(group) => {
                    for operation in group.into_operations() {
                        self.apply_queued(operation, &options)?;
                    }
                }
                EntityBatch::Ungrouped(operation) => self.apply_queued(operation, &options)?,
            }
        }
        Ok(())
    }
}

impl MemoryDialect {
    /// Applies one queued operation against the store.
    fn apply_queued(
        &mut self,
        operation: Operation,
        options: &gridmap_options::OptionsContainer,
    ) -> DialectResult<()> {
        match operation {
            Operation::InsertOrUpdateTuple { key, tuple, .. } => {
                self.insert_or_update_tuple(&key, &tuple, &TupleContext::new(options))
            }
            Operation::RemoveTuple { key, .. } => {
                self.remove_tuple(&key, &TupleContext::new(options))
            }
            Operation::InsertOrUpdateAssociation { key, association, .. } => self
                .insert_or_update_association(
                    &key,
                    &association,
                    &AssociationContext::new(options),
                ),
            Operation::RemoveAssociation { key, .. } => {
                self.remove_association(&key, &AssociationContext::new(options))
            }
        }
    }
}

impl GroupingByEntityDialect for MemoryDialect {
    fn flush_pending_operations(
        &mut self,
        _key: &EntityKey,
        _ctx: &TupleContext<'_>,
    ) -> DialectResult<()> {
        // Batches apply synchronously, so there is never a pending
        // per-entity group left to flush.
        Ok(())
    }
}

impl OptimisticLockingDialect for MemoryDialect {
    fn update_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        new_tuple: &Tuple,
        _ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome> {
        if !Self::matches_lock_state(self.tuples.get(key), old_lock_state) {
            return Ok(CasOutcome::StaleState);
        }
        let stored = self.tuples.entry(key.clone()).or_default();
        Self::apply_tuple_operations(stored, new_tuple);
        Ok(CasOutcome::Applied)
    }

    fn remove_tuple_with_optimistic_lock(
        &mut self,
        key: &EntityKey,
        old_lock_state: &TupleSnapshot,
        _ctx: &TupleContext<'_>,
    ) -> DialectResult<CasOutcome> {
        if !Self::matches_lock_state(self.tuples.get(key), old_lock_state) {
            return Ok(CasOutcome::StaleState);
        }
        self.tuples.remove(key);
        Ok(CasOutcome::Applied)
    }
}

impl QueryableDialect for MemoryDialect {
    type NativeQuery = MemoryQuery;

    fn execute_backend_query(
        &self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        _ctx: &TupleContext<'_>,
    ) -> DialectResult<Vec<Tuple>> {
        let keys = self.matching_keys(query.query(), params)?;
        let tuples: Vec<Tuple> = keys
            .iter()
            .filter_map(|key| self.tuples.get(key))
            .map(|columns| Tuple::from_snapshot(TupleSnapshot::new(columns.clone())))
            .collect();
        Ok(params.row_selection().apply(tuples))
    }

    fn execute_backend_update_query(
        &mut self,
        query: &BackendQuery<Self::NativeQuery>,
        params: &QueryParameters,
        _ctx: &TupleContext<'_>,
    ) -> DialectResult<u64> {
        let native = query.query();
        let keys = self.matching_keys(native, params)?;

        if native.assignments.is_empty() {
            // An update with nothing to assign removes the matches.
            for key in &keys {
                self.tuples.remove(key);
            }
        } else {
            let mut assignments = Vec::with_capacity(native.assignments.len());
            for assignment in &native.assignments {
                assignments
                    .push((assignment.column.clone(), Self::resolve(&assignment.value, params)?));
            }
            for key in &keys {
                if let Some(stored) = self.tuples.get_mut(key) {
                    for (column, value) in &assignments {
                        stored.insert(column.clone(), value.clone());
                    }
                }
            }
        }

        Ok(keys.len() as u64)
    }

    fn parameter_metadata_builder(&self) -> Box<dyn ParameterMetadataBuilder> {
        // Native queries are pre-structured objects; there is nothing to scan.
        Box::new(NoopParameterMetadataBuilder::new())
    }

    fn parse_native_query(&self, native_query: &str) -> DialectResult<Self::NativeQuery> {
        serde_json::from_str(native_query)
            .map_err(|e| DialectError::Query(format!("invalid memory query: {e}")))
    }
}
