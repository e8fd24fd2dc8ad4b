//! Target type universe for spanner-migrate.
//!
//! This module defines the closed set of Spanner scalar kinds that every source
//! type is mapped onto, plus the `SchemaIssue` annotations that describe the
//! fidelity trade-offs made by each mapping.

use serde::{Serialize, Serializer};
use std::fmt;

/// Spanner scalar kinds.
///
/// Every source column ends up as exactly one of these, optionally wrapped in an
/// array (see [`TargetType::is_array`]). Internal code matches on this enum
/// exhaustively, so adding a kind forces every conversion site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// BOOL
    Bool,
    /// BYTES(len)
    Bytes,
    /// DATE (civil date, no time zone)
    Date,
    /// FLOAT64 (IEEE 754 double)
    Float64,
    /// INT64
    Int64,
    /// STRING(len)
    String,
    /// TIMESTAMP (an absolute instant)
    Timestamp,
}

impl TypeKind {
    /// Spanner DDL keyword for this kind.
    pub fn ddl_name(&self) -> &'static str {
        match self {
            TypeKind::Bool => "BOOL",
            TypeKind::Bytes => "BYTES",
            TypeKind::Date => "DATE",
            TypeKind::Float64 => "FLOAT64",
            TypeKind::Int64 => "INT64",
            TypeKind::String => "STRING",
            TypeKind::Timestamp => "TIMESTAMP",
        }
    }

    /// Whether the DDL form of this kind carries a length.
    pub fn has_length(&self) -> bool {
        matches!(self, TypeKind::Bytes | TypeKind::String)
    }
}

/// Maximum length marker used for `STRING(MAX)` and `BYTES(MAX)`.
pub const MAX_LENGTH: Option<i64> = None;

/// A Spanner column type: scalar kind, optional length and array flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetType {
    /// Scalar kind (the element kind for arrays)
    pub kind: TypeKind,
    /// Length for STRING/BYTES; `None` means MAX
    pub len: Option<i64>,
    /// True for `ARRAY<kind>`
    pub is_array: bool,
}

impl TargetType {
    /// A scalar type without a length (or with MAX length for STRING/BYTES).
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            len: MAX_LENGTH,
            is_array: false,
        }
    }

    /// A STRING or BYTES type with an explicit length.
    pub fn with_len(kind: TypeKind, len: i64) -> Self {
        Self {
            kind,
            len: Some(len),
            is_array: false,
        }
    }

    /// Unbounded STRING, the universal fallback type.
    pub fn string_max() -> Self {
        Self::new(TypeKind::String)
    }

    /// The array form of this type.
    pub fn into_array(self) -> Self {
        Self {
            is_array: true,
            ..self
        }
    }

    fn scalar_ddl(&self) -> String {
        if self.kind.has_length() {
            match self.len {
                Some(len) => format!("{}({len})", self.kind.ddl_name()),
                None => format!("{}(MAX)", self.kind.ddl_name()),
            }
        } else {
            self.kind.ddl_name().to_string()
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "ARRAY<{}>", self.scalar_ddl())
        } else {
            f.write_str(&self.scalar_ddl())
        }
    }
}

impl Serialize for TargetType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// How serious a [`SchemaIssue`] is for the migrated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, no data is lost
    Note,
    /// Data or semantics may differ after migration
    Warning,
}

/// A known, non-fatal fidelity trade-off attached to a converted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaIssue {
    /// Decimal with declared precision <= 15 stored as FLOAT64
    PrecisionFits,
    /// Decimal with larger (or unbounded) precision stored as FLOAT64
    PrecisionLoss,
    /// Narrow integer/float widened to the 64-bit target type
    Widened,
    /// Offset-naive timestamp stored in a time-zone-aware type
    TimestampSemanticsDiffer,
    /// No suitable target type; stored as STRING(MAX)
    NoSuitableType,
    /// Multi-dimensional array flattened to STRING(MAX)
    MultiDimensionalArray,
    /// Column default dropped
    DefaultValue,
    /// Foreign key could not be carried over
    ForeignKey,
    /// Auto-increment (serial) semantics dropped
    Serial,
    /// Time-of-day type without a target equivalent
    Time,
}

impl SchemaIssue {
    /// Severity of this issue.
    pub fn severity(&self) -> Severity {
        match self {
            SchemaIssue::PrecisionFits | SchemaIssue::Widened | SchemaIssue::Serial => {
                Severity::Note
            }
            SchemaIssue::PrecisionLoss
            | SchemaIssue::TimestampSemanticsDiffer
            | SchemaIssue::NoSuitableType
            | SchemaIssue::MultiDimensionalArray
            | SchemaIssue::DefaultValue
            | SchemaIssue::ForeignKey
            | SchemaIssue::Time => Severity::Warning,
        }
    }

    /// Human-readable description for reports.
    pub fn description(&self) -> &'static str {
        match self {
            SchemaIssue::PrecisionFits => "numeric precision fits in FLOAT64",
            SchemaIssue::PrecisionLoss => "numeric stored as FLOAT64 may lose precision",
            SchemaIssue::Widened => "widened to a 64-bit type, storage increases",
            SchemaIssue::TimestampSemanticsDiffer => {
                "timestamp without time zone stored as time-zone-aware TIMESTAMP"
            }
            SchemaIssue::NoSuitableType => "no suitable type, stored as STRING(MAX)",
            SchemaIssue::MultiDimensionalArray => {
                "multi-dimensional array stored as STRING(MAX)"
            }
            SchemaIssue::DefaultValue => "column default value dropped",
            SchemaIssue::ForeignKey => "foreign key dropped",
            SchemaIssue::Serial => "serial auto-increment dropped",
            SchemaIssue::Time => "time of day stored as STRING(MAX)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_ddl() {
        assert_eq!(TargetType::new(TypeKind::Int64).to_string(), "INT64");
        assert_eq!(TargetType::string_max().to_string(), "STRING(MAX)");
        assert_eq!(
            TargetType::with_len(TypeKind::String, 40).to_string(),
            "STRING(40)"
        );
        assert_eq!(
            TargetType::new(TypeKind::Bytes).into_array().to_string(),
            "ARRAY<BYTES(MAX)>"
        );
        assert_eq!(
            TargetType::new(TypeKind::Timestamp).into_array().to_string(),
            "ARRAY<TIMESTAMP>"
        );
    }

    #[test]
    fn test_issue_severity() {
        assert_eq!(SchemaIssue::PrecisionFits.severity(), Severity::Note);
        assert_eq!(SchemaIssue::PrecisionLoss.severity(), Severity::Warning);
        assert_eq!(SchemaIssue::Widened.severity(), Severity::Note);
        assert_eq!(SchemaIssue::NoSuitableType.severity(), Severity::Warning);
    }

    #[test]
    fn test_target_type_serializes_as_ddl() {
        let json = serde_json::to_string(&TargetType::with_len(TypeKind::String, 1)).unwrap();
        assert_eq!(json, "\"STRING(1)\"");
    }
}
