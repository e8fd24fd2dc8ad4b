//! Conversion statistics.
//!
//! Each counter is owned by exactly one pass: row counts, statement counts and
//! the reparse counter are collected in schema mode, good/bad row counts in data
//! mode. [`crate::Conv`] enforces that attribution; `Stats` only stores numbers.

use serde::Serialize;
use std::collections::BTreeMap;

/// Per-statement-kind counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatementStats {
    /// Statements that affected the schema
    pub schema: i64,
    /// Statements that carried data (COPY, INSERT)
    pub data: i64,
    /// Statements with no effect
    pub skip: i64,
    /// Statements that could not be (fully) processed
    pub error: i64,
}

/// Statistics accumulated over a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    /// Rows seen per source table
    pub rows: BTreeMap<String, i64>,
    /// Rows converted and emitted, per source table
    pub good_rows: BTreeMap<String, i64>,
    /// Rows that failed conversion, per source table
    pub bad_rows: BTreeMap<String, i64>,
    /// Counters keyed by statement kind (e.g. `CreateTable`)
    pub statements: BTreeMap<String, StatementStats>,
    /// Distinct unexpected conditions and how often each occurred
    pub unexpected: BTreeMap<String, i64>,
    /// Number of chunk parse retries
    pub reparsed: i64,
}

impl Stats {
    pub fn total_rows(&self) -> i64 {
        self.rows.values().sum()
    }

    pub fn total_good_rows(&self) -> i64 {
        self.good_rows.values().sum()
    }

    pub fn total_bad_rows(&self) -> i64 {
        self.bad_rows.values().sum()
    }

    /// Statement counters for one kind; zeroes if never seen.
    pub fn statement(&self, kind: &str) -> StatementStats {
        self.statements.get(kind).copied().unwrap_or_default()
    }

    pub(crate) fn statement_mut(&mut self, kind: &str) -> &mut StatementStats {
        self.statements.entry(kind.to_string()).or_default()
    }
}
