//! Error types for dump processing.

use thiserror::Error;

/// Fatal errors: the input stream itself failed.
///
/// Everything else (unparsable statements, unknown tables, bad rows) is
/// absorbed into the conversion statistics.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Failed to read dump: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dump processing.
pub type Result<T> = std::result::Result<T, DumpError>;

/// Reasons a single statement could not be applied.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error(transparent)]
    Conversion(#[from] migrate_core::ConversionError),

    #[error("Unsupported INSERT source: {0}")]
    UnsupportedInsertSource(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}
