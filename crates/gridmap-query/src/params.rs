//! Query parameters: row selection and pre-typed named parameters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gridmap_core::Value;

/// The store-level type of a query parameter.
///
/// Parameter types are resolved once, when the parameters are bound, so that
/// dialects executing the same query many times do not re-derive them per
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridType {
    /// Boolean parameter
    Bool,
    /// 64-bit integer parameter
    Int,
    /// 64-bit float parameter
    Float,
    /// String parameter
    String,
    /// Binary parameter
    Bytes,
    /// Array parameter
    Array,
    /// Explicit null parameter
    Null,
}

impl GridType {
    /// The store-level type of a value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::Bytes(_) => Self::Bytes,
            Value::Array(_) => Self::Array,
        }
    }
}

/// A parameter value paired with its resolved store-level type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    grid_type: GridType,
    value: Value,
}

impl TypedValue {
    /// Pair a value with an explicitly resolved type.
    #[must_use]
    pub const fn new(grid_type: GridType, value: Value) -> Self {
        Self { grid_type, value }
    }

    /// Pair a value with its own store-level type.
    #[must_use]
    pub fn of(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self { grid_type: GridType::of(&value), value }
    }

    /// The resolved store-level type.
    #[inline]
    #[must_use]
    pub const fn grid_type(&self) -> GridType {
        self.grid_type
    }

    /// The parameter value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

/// Which rows of a result set to return.
///
/// Both bounds are optional; an unset selection returns everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSelection {
    first_row: Option<usize>,
    max_rows: Option<usize>,
}

impl RowSelection {
    /// Select every row.
    #[must_use]
    pub const fn all() -> Self {
        Self { first_row: None, max_rows: None }
    }

    /// Select `max_rows` rows starting at `first_row` (zero-based).
    #[must_use]
    pub const fn new(first_row: Option<usize>, max_rows: Option<usize>) -> Self {
        Self { first_row, max_rows }
    }

    /// The zero-based index of the first row to return.
    #[inline]
    #[must_use]
    pub const fn first_row(&self) -> Option<usize> {
        self.first_row
    }

    /// The maximum number of rows to return.
    #[inline]
    #[must_use]
    pub const fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }

    /// Apply this selection to an in-memory result list.
    #[must_use]
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        let skip = self.first_row.unwrap_or(0);
        let take = self.max_rows.unwrap_or(usize::MAX);
        rows.into_iter().skip(skip).take(take).collect()
    }
}

/// Everything a dialect needs to execute one query: row selection plus named
/// parameters, each pre-resolved to its store-level type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    row_selection: RowSelection,
    named_parameters: HashMap<String, TypedValue>,
}

impl QueryParameters {
    /// Parameters selecting every row, with no named parameters.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Create parameters from a row selection and named parameter map.
    #[must_use]
    pub fn new(row_selection: RowSelection, named_parameters: HashMap<String, TypedValue>) -> Self {
        Self { row_selection, named_parameters }
    }

    /// Add a named parameter, resolving its type from the value.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named_parameters.insert(name.into(), TypedValue::of(value));
        self
    }

    /// Restrict the rows returned.
    #[must_use]
    pub const fn with_row_selection(mut self, row_selection: RowSelection) -> Self {
        self.row_selection = row_selection;
        self
    }

    /// The row selection.
    #[inline]
    #[must_use]
    pub const fn row_selection(&self) -> &RowSelection {
        &self.row_selection
    }

    /// The named parameters, keyed by name.
    #[inline]
    #[must_use]
    pub const fn named_parameters(&self) -> &HashMap<String, TypedValue> {
        &self.named_parameters
    }

    /// Look up one named parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&TypedValue> {
        self.named_parameters.get(name)
    }
}
