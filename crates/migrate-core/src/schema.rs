//! Source and target schema definitions.
//!
//! ## Type Hierarchy
//!
//! **Source side** (as read from the dump, keyed by source names):
//! - `SourceColumn` - Column descriptor: type id, modifiers, array bounds, issues
//! - `SourceTable` - Ordered columns plus the source primary key
//!
//! **Target side** (Spanner, keyed by legalised target names):
//! - `TargetColumn` - Column with its mapped `TargetType`
//! - `TargetTable` - Ordered columns, primary key, foreign keys, secondary indexes
//!
//! Both sides keep `col_names` for declaration order alongside a name-keyed map,
//! so DDL and `INSERT` without a column list see columns in source order.

use crate::types::{SchemaIssue, TargetType};
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// Source Schema
// ============================================================================

/// A PostgreSQL column as declared in `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceColumn {
    /// Source column name (case-folded unless quoted)
    pub name: String,

    /// PostgreSQL type id, e.g. `int8`, `varchar`, `timestamptz`
    pub type_id: String,

    /// Type modifiers, e.g. `[10, 2]` for `numeric(10,2)`
    pub mods: Vec<i64>,

    /// Array bounds; one entry per dimension, `-1` when unbounded
    pub array_bounds: Vec<i64>,

    /// Whether the column is declared NOT NULL
    pub not_null: bool,

    /// Conversion issues accumulated while building the target column
    pub issues: Vec<SchemaIssue>,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            mods: Vec::new(),
            array_bounds: Vec::new(),
            not_null: false,
            issues: Vec::new(),
        }
    }

    /// Append an issue unless it is already recorded.
    pub fn add_issue(&mut self, issue: SchemaIssue) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }
}

/// A PostgreSQL table as declared in the dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceTable {
    /// Source table name (`schema.table` unless in `public`)
    pub name: String,

    /// Column names in declaration order
    pub col_names: Vec<String>,

    /// Column descriptors keyed by column name
    pub col_defs: HashMap<String, SourceColumn>,

    /// Source primary key column names
    pub primary_keys: Vec<String>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a column, keeping declaration order.
    pub fn push_column(&mut self, column: SourceColumn) {
        self.col_names.push(column.name.clone());
        self.col_defs.insert(column.name.clone(), column);
    }

    pub fn column(&self, name: &str) -> Option<&SourceColumn> {
        self.col_defs.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut SourceColumn> {
        self.col_defs.get_mut(name)
    }
}

// ============================================================================
// Target Schema
// ============================================================================

/// A Spanner column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetColumn {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TargetType,

    pub not_null: bool,
}

impl TargetColumn {
    pub fn new(name: impl Into<String>, ty: TargetType) -> Self {
        Self {
            name: name.into(),
            ty,
            not_null: false,
        }
    }
}

/// One key part of a primary key or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexKey {
    pub column: String,
    pub desc: bool,
}

impl IndexKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            desc: false,
        }
    }
}

/// A foreign key between two target tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub refer_table: String,
    pub refer_columns: Vec<String>,
}

/// A secondary index on a target table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryIndex {
    pub name: String,
    pub unique: bool,
    pub keys: Vec<IndexKey>,
}

/// A Spanner table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetTable {
    /// Target table name
    pub name: String,

    /// Column names in source declaration order
    pub col_names: Vec<String>,

    /// Column definitions keyed by target column name
    pub col_defs: HashMap<String, TargetColumn>,

    /// Primary key; empty until a constraint or synthetic key provides one
    pub primary_keys: Vec<IndexKey>,

    pub foreign_keys: Vec<ForeignKey>,

    pub indexes: Vec<SecondaryIndex>,
}

impl TargetTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a column, keeping declaration order.
    pub fn push_column(&mut self, column: TargetColumn) {
        self.col_names.push(column.name.clone());
        self.col_defs.insert(column.name.clone(), column);
    }

    pub fn column(&self, name: &str) -> Option<&TargetColumn> {
        self.col_defs.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut TargetColumn> {
        self.col_defs.get_mut(name)
    }

    /// Whether a column name is already used, ignoring case.
    pub fn has_column_ci(&self, name: &str) -> bool {
        self.col_names.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}
