//! Error types for PostgreSQL value decoding.

use thiserror::Error;

/// Errors produced when decoding a PostgreSQL text value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgValueError {
    #[error("Invalid boolean: '{0}'")]
    InvalidBool(String),

    #[error("Invalid integer: '{0}'")]
    InvalidInt(String),

    #[error("Invalid float: '{0}'")]
    InvalidFloat(String),

    #[error("Invalid date: '{0}'")]
    InvalidDate(String),

    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    #[error("Local time '{value}' does not exist in timezone {timezone}")]
    NonexistentLocalTime { value: String, timezone: String },

    #[error("Bytes value must start with \\x: '{0}'")]
    MissingBytesPrefix(String),

    #[error("Invalid hex in bytes value: {0}")]
    InvalidHex(String),

    #[error("Array value must be wrapped in {{ }}: '{0}'")]
    InvalidArrayDelimiters(String),

    #[error("Array element {index}: {source}")]
    InvalidArrayElement {
        index: usize,
        #[source]
        source: Box<PgValueError>,
    },
}

/// Result type for value decoding.
pub type Result<T> = std::result::Result<T, PgValueError>;
