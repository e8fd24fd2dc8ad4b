//! Typed values emitted to the row sink.
//!
//! Values are already converted to the target column's kind. Arrays carry one
//! concrete collection per scalar kind because the Spanner client layer only
//! accepts homogeneously typed arrays; elements are `Option` since PostgreSQL
//! arrays may contain `NULL` entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::types::TypeKind;

/// A single converted column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Float64(f64),
    Int64(i64),
    String(String),
    Timestamp(DateTime<Utc>),

    BoolArray(Vec<Option<bool>>),
    BytesArray(Vec<Option<Vec<u8>>>),
    DateArray(Vec<Option<NaiveDate>>),
    Float64Array(Vec<Option<f64>>),
    Int64Array(Vec<Option<i64>>),
    StringArray(Vec<Option<String>>),
    TimestampArray(Vec<Option<DateTime<Utc>>>),
}

impl Value {
    /// The scalar kind of this value (element kind for arrays).
    pub fn kind(&self) -> TypeKind {
        match self {
            Value::Bool(_) | Value::BoolArray(_) => TypeKind::Bool,
            Value::Bytes(_) | Value::BytesArray(_) => TypeKind::Bytes,
            Value::Date(_) | Value::DateArray(_) => TypeKind::Date,
            Value::Float64(_) | Value::Float64Array(_) => TypeKind::Float64,
            Value::Int64(_) | Value::Int64Array(_) => TypeKind::Int64,
            Value::String(_) | Value::StringArray(_) => TypeKind::String,
            Value::Timestamp(_) | Value::TimestampArray(_) => TypeKind::Timestamp,
        }
    }

    /// Whether this value is one of the typed array variants.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Value::BoolArray(_)
                | Value::BytesArray(_)
                | Value::DateArray(_)
                | Value::Float64Array(_)
                | Value::Int64Array(_)
                | Value::StringArray(_)
                | Value::TimestampArray(_)
        )
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A converted row, as handed to a [`crate::RowSink`].
///
/// `columns` and `values` always have the same length. Source NULLs are
/// dropped from both, so a row may carry fewer columns than its table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Target table name
    pub table: String,
    /// Target column names, in emission order
    pub columns: Vec<String>,
    /// Typed values, aligned with `columns`
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(table: impl Into<String>, columns: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            table: table.into(),
            columns,
            values,
        }
    }

    /// Look up a value by target column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }
}
