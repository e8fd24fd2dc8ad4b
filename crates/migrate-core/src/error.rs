//! Error types for conversion-domain failures.
//!
//! None of these abort a run: callers absorb them into statistics, bad-row
//! samples or the unexpected-condition counter.

use thiserror::Error;

/// Errors raised while mapping names or converting rows.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Empty identifier")]
    EmptyIdentifier,

    #[error("Name map inconsistency: '{target}' maps back to '{found}', expected '{expected}'")]
    InconsistentNameMap {
        target: String,
        expected: String,
        found: String,
    },

    #[error("No unused name found for '{0}'")]
    NameSpaceExhausted(String),

    #[error("Column/value count mismatch: {columns} columns, {values} values")]
    ArityMismatch { columns: usize, values: usize },

    #[error("Column '{column}': {message}")]
    InvalidValue { column: String, message: String },
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
