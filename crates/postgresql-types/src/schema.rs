//! PostgreSQL column type mapping.
//!
//! This module maps PostgreSQL type ids (as they appear in a dump's
//! `CREATE TABLE`) to Spanner `TargetType`s, together with the `SchemaIssue`s
//! that describe what the mapping gives up.

use migrate_core::{SchemaIssue, TargetType, TypeKind};

/// Largest decimal precision a FLOAT64 represents reliably.
///
/// A 53-bit mantissa holds about 15.95 decimal digits.
pub const FLOAT64_SAFE_PRECISION: i64 = 15;

/// Normalise a PostgreSQL type name to its canonical type id.
///
/// Accepts SQL-standard spellings and internal aliases, e.g. `integer`,
/// `character varying`, `timestamp with time zone`, `serial4`.
///
/// # Example
///
/// ```
/// use postgresql_types::canonical_type_id;
///
/// assert_eq!(canonical_type_id("INTEGER"), "int4");
/// assert_eq!(canonical_type_id("character varying"), "varchar");
/// assert_eq!(canonical_type_id("geometry"), "geometry");
/// ```
pub fn canonical_type_id(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let canonical = match lower.as_str() {
        "boolean" => "bool",
        "smallint" => "int2",
        "integer" | "int" => "int4",
        "bigint" => "int8",
        "real" => "float4",
        "double precision" | "float" => "float8",
        "decimal" => "numeric",
        "character varying" | "char varying" => "varchar",
        "character" | "char" => "bpchar",
        "serial2" => "smallserial",
        "serial4" => "serial",
        "serial8" => "bigserial",
        "timestamp without time zone" => "timestamp",
        "timestamp with time zone" => "timestamptz",
        "time without time zone" => "time",
        "time with time zone" => "timetz",
        other => return other.to_string(),
    };
    canonical.to_string()
}

/// Map a PostgreSQL type id and its modifiers to a Spanner type.
///
/// Total: every type id yields a usable type. Ids without a Spanner
/// counterpart fall back to `STRING(MAX)` with [`SchemaIssue::NoSuitableType`].
///
/// # Arguments
///
/// * `type_id` - PostgreSQL type id, canonical or alias (see [`canonical_type_id`])
/// * `mods` - Type modifiers, e.g. `[10, 2]` for `numeric(10,2)`, `[40]` for `varchar(40)`
///
/// # Example
///
/// ```
/// use migrate_core::{SchemaIssue, TargetType, TypeKind};
/// use postgresql_types::map_type;
///
/// let (ty, issues) = map_type("numeric", &[15, 2]);
/// assert_eq!(ty, TargetType::new(TypeKind::Float64));
/// assert_eq!(issues, vec![SchemaIssue::PrecisionFits]);
/// ```
pub fn map_type(type_id: &str, mods: &[i64]) -> (TargetType, Vec<SchemaIssue>) {
    let id = canonical_type_id(type_id);
    match id.as_str() {
        // Boolean
        "bool" => (TargetType::new(TypeKind::Bool), vec![]),

        // Integer types
        "int8" => (TargetType::new(TypeKind::Int64), vec![]),
        "int4" | "int2" => (TargetType::new(TypeKind::Int64), vec![SchemaIssue::Widened]),
        "bigserial" | "serial" | "smallserial" => {
            (TargetType::new(TypeKind::Int64), vec![SchemaIssue::Serial])
        }

        // Floating point
        "float8" => (TargetType::new(TypeKind::Float64), vec![]),
        "float4" => (TargetType::new(TypeKind::Float64), vec![SchemaIssue::Widened]),

        // Exact numeric, stored as FLOAT64
        "numeric" => {
            let issue = match mods.first() {
                Some(&precision) if precision <= FLOAT64_SAFE_PRECISION => {
                    SchemaIssue::PrecisionFits
                }
                _ => SchemaIssue::PrecisionLoss,
            };
            (TargetType::new(TypeKind::Float64), vec![issue])
        }

        // String types
        "bpchar" => {
            let len = mods.first().copied().unwrap_or(1);
            (TargetType::with_len(TypeKind::String, len), vec![])
        }
        "varchar" => match mods.first() {
            Some(&len) => (TargetType::with_len(TypeKind::String, len), vec![]),
            None => (TargetType::string_max(), vec![]),
        },
        "text" | "json" | "jsonb" => (TargetType::string_max(), vec![]),
        "uuid" => (TargetType::with_len(TypeKind::String, 36), vec![]),

        // Binary
        "bytea" => (TargetType::new(TypeKind::Bytes), vec![]),

        // Date/time types
        "date" => (TargetType::new(TypeKind::Date), vec![]),
        "timestamptz" => (TargetType::new(TypeKind::Timestamp), vec![]),
        "timestamp" => (
            TargetType::new(TypeKind::Timestamp),
            vec![SchemaIssue::TimestampSemanticsDiffer],
        ),
        "time" | "timetz" => (TargetType::string_max(), vec![SchemaIssue::Time]),

        // Fallback for unknown types
        _ => (TargetType::string_max(), vec![SchemaIssue::NoSuitableType]),
    }
}

/// Map a possibly-array column to a Spanner type.
///
/// One array dimension becomes `ARRAY<T>`. More than one has no Spanner
/// equivalent and degrades to `STRING(MAX)` with
/// [`SchemaIssue::MultiDimensionalArray`].
pub fn map_column_type(
    type_id: &str,
    mods: &[i64],
    array_bounds: &[i64],
) -> (TargetType, Vec<SchemaIssue>) {
    match array_bounds.len() {
        0 => map_type(type_id, mods),
        1 => {
            let (ty, issues) = map_type(type_id, mods);
            (ty.into_array(), issues)
        }
        _ => (
            TargetType::string_max(),
            vec![SchemaIssue::MultiDimensionalArray],
        ),
    }
}
