//! Column values stored in tuples and association rows.
//!
//! This module provides the [`Value`] enum, which represents every value a
//! grid dialect may be handed for a single column. Dialects map these onto
//! whatever their store supports natively; the mapping engine is expected to
//! have already lowered richer domain types down to this closed set.
//!
//! # Example
//!
//! ```
//! use gridmap_core::Value;
//!
//! // Create values via From trait
//! let name: Value = "Alice".into();
//! let age: Value = 30i64.into();
//! let score: Value = 95.5f64.into();
//! let active: Value = true.into();
//!
//! // Access typed values
//! assert_eq!(name.as_str(), Some("Alice"));
//! assert_eq!(age.as_int(), Some(30));
//! assert_eq!(score.as_float(), Some(95.5));
//! assert_eq!(active.as_bool(), Some(true));
//! ```

use serde::{Deserialize, Serialize};

/// A value stored in a tuple column or an association row cell.
///
/// # Supported Types
///
/// | Variant | Rust Type | Use Case |
/// |---------|-----------|----------|
/// | `Null` | - | Present-but-null columns |
/// | `Bool` | `bool` | Boolean flags |
/// | `Int` | `i64` | Integers, counters, versions |
/// | `Float` | `f64` | Numeric measurements |
/// | `String` | `String` | Text data |
/// | `Bytes` | `Vec<u8>` | Binary data |
/// | `Array` | `Vec<Value>` | Lists of values |
///
/// Note that `Null` is a *value*: a column holding `Value::Null` is part of
/// the record, unlike a column that is absent altogether. The tuple model
/// relies on this distinction to tell "set to null" apart from "removed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value for a column that is present but carries no data
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Returns `true` if this value is `Null`.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the boolean value, if this is a `Bool`.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer value, if this is an `Int`.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float value, if this is a `Float`.
    #[inline]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the string value, if this is a `String`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the bytes, if this is a `Bytes` value.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the array elements, if this is an `Array`.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Name of this value's variant, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(a: Vec<Value>) -> Self {
        Self::Array(a)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(2.5f64), Value::Float(2.5));
        assert_eq!(Value::from("hi"), Value::String("hi".to_owned()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(1i64)), Value::Int(1));
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Int(7).as_float(), None);
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(false).is_null());
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
    }
}
