//! Core types for spanner-migrate.
//!
//! This crate provides the source-agnostic parts of a schema and data
//! migration into Cloud Spanner:
//!
//! - [`TargetType`] / [`TypeKind`] - Spanner type universe and [`SchemaIssue`] annotations
//! - [`Value`] / [`Row`] - Typed values handed to a [`RowSink`]
//! - [`SourceTable`] / [`TargetTable`] - Source and target schema definitions
//! - [`NameMap`] - Collision-free bidirectional identifier mapping
//! - [`Conv`] - Conversion state shared by both passes over the input
//! - [`Stats`] - Row, statement and unexpected-condition counters
//! - [`SpannerDdl`] - DDL printer for the finished target schema
//!
//! # Architecture
//!
//! ```text
//! migrate-core (this crate)
//!    │
//!    ├─── postgresql-types   (PostgreSQL type mapping and value decoding)
//!    │
//!    └─── postgresql-dump    (dump reader, statement classifier, row converter)
//! ```
//!
//! # Example
//!
//! ```rust
//! use migrate_core::{Conv, RowCollector};
//!
//! let rows = RowCollector::new();
//! let mut conv = Conv::default();
//! conv.set_sink(rows.clone());
//! assert!(conv.schema_mode());
//! ```

pub mod config;
pub mod conv;
pub mod ddl;
pub mod error;
pub mod names;
pub mod schema;
pub mod stats;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use config::{parse_timezone, ConfigError, ConvOptions};
pub use conv::{BadRow, ColumnIssue, Conv, Mode, RowCollector, RowSink, SyntheticKey};
pub use ddl::{SpannerDdl, ToDdl};
pub use error::{ConversionError, Result};
pub use names::NameMap;
pub use schema::{
    ForeignKey, IndexKey, SecondaryIndex, SourceColumn, SourceTable, TargetColumn, TargetTable,
};
pub use stats::{StatementStats, Stats};
pub use types::{SchemaIssue, Severity, TargetType, TypeKind};
pub use values::{Row, Value};
