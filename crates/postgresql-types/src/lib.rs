//! PostgreSQL type conversions for migrate-core.
//!
//! This crate provides the PostgreSQL side of a dump migration, without any I/O:
//!
//! - **Type mapping**: PostgreSQL type id + modifiers → Spanner `TargetType` plus
//!   the `SchemaIssue`s the mapping implies ([`map_type`], [`map_column_type`])
//! - **Value decoding**: PostgreSQL text values (as found in `COPY` payloads and
//!   `INSERT` literals) → typed `Value`s ([`convert_value`], [`convert_scalar`],
//!   [`convert_array`])
//!
//! # Example
//!
//! ```
//! use migrate_core::{SchemaIssue, TargetType, TypeKind, Value};
//! use postgresql_types::{convert_value, map_type};
//!
//! # fn main() -> Result<(), postgresql_types::PgValueError> {
//! let (ty, issues) = map_type("int4", &[]);
//! assert_eq!(ty, TargetType::new(TypeKind::Int64));
//! assert_eq!(issues, vec![SchemaIssue::Widened]);
//!
//! let value = convert_value(&ty, "int4", &chrono_tz::Tz::UTC, "42")?;
//! assert_eq!(value, Value::Int64(42));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod reverse;
pub mod schema;
pub mod timestamp;

pub use error::PgValueError;
pub use reverse::{convert_array, convert_scalar, convert_value};
pub use schema::{canonical_type_id, map_column_type, map_type, FLOAT64_SAFE_PRECISION};
pub use timestamp::{parse_timestamp, parse_timestamptz};
