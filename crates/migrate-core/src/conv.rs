//! Conversion State: the aggregate every conversion component reads and mutates.
//!
//! A `Conv` is created once per run and lives through both passes over the
//! input. Mode-dependent side effects are gated here so callers can invoke
//! the same bookkeeping methods in either pass without double counting.

use crate::config::{ConfigError, ConvOptions};
use crate::schema::{IndexKey, SourceTable, TargetColumn, TargetTable};
use crate::stats::Stats;
use crate::types::{SchemaIssue, TargetType, TypeKind};
use crate::values::Row;
use chrono_tz::Tz;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

// ============================================================================
// Row Sink
// ============================================================================

/// Receiver of converted rows.
///
/// Called synchronously on the conversion thread, once per accepted row.
pub trait RowSink {
    fn consume(&mut self, row: Row);
}

impl<F> RowSink for F
where
    F: FnMut(Row),
{
    fn consume(&mut self, row: Row) {
        self(row)
    }
}

/// A sink that keeps every row in memory, with a shared handle for reading
/// them back after the sink has been handed to a [`Conv`].
#[derive(Debug, Clone, Default)]
pub struct RowCollector {
    rows: Rc<RefCell<Vec<Row>>>,
}

impl RowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the rows received so far.
    pub fn rows(&self) -> Vec<Row> {
        self.rows.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl RowSink for RowCollector {
    fn consume(&mut self, row: Row) {
        self.rows.borrow_mut().push(row);
    }
}

// ============================================================================
// Supporting Types
// ============================================================================

/// Which pass over the input is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build the target schema and count rows
    Schema,
    /// Convert and emit rows
    Data,
}

/// A primary key column synthesized for a table without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticKey {
    /// Target column name of the key
    pub column: String,
    /// Next sequence value; stored values are its bit reversal
    pub sequence: i64,
}

/// A row that failed conversion, kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadRow {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl BadRow {
    fn byte_size(&self) -> usize {
        self.table.len()
            + self.columns.iter().map(String::len).sum::<usize>()
            + self.values.iter().map(String::len).sum::<usize>()
    }
}

impl fmt::Display for BadRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table={} cols={:?} data={:?}",
            self.table, self.columns, self.values
        )
    }
}

/// An issue attached to one source column, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnIssue {
    pub table: String,
    pub column: String,
    pub issue: SchemaIssue,
}

// ============================================================================
// Conv
// ============================================================================

/// Conversion state for one migration run.
pub struct Conv {
    /// Target schema keyed by target table name
    pub sp_schema: BTreeMap<String, TargetTable>,

    /// Source schema keyed by source table name
    pub src_schema: BTreeMap<String, SourceTable>,

    /// Synthesized keys keyed by target table name
    pub synthetic_keys: HashMap<String, SyntheticKey>,

    /// Source/target identifier mapping
    pub names: crate::names::NameMap,

    mode: Mode,
    sink: Option<Box<dyn RowSink>>,
    bad_rows: Vec<BadRow>,
    bad_row_bytes: usize,
    stats: Stats,
    timezone: Tz,
    options: ConvOptions,
}

impl fmt::Debug for Conv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conv")
            .field("mode", &self.mode)
            .field("tables", &self.sp_schema.len())
            .field("timezone", &self.timezone)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for Conv {
    fn default() -> Self {
        Self::with_timezone(ConvOptions::default(), Tz::UTC)
    }
}

impl Conv {
    /// Create a conversion state in schema mode.
    pub fn new(options: ConvOptions) -> Result<Self, ConfigError> {
        let tz = options.tz()?;
        Ok(Self::with_timezone(options, tz))
    }

    fn with_timezone(options: ConvOptions, timezone: Tz) -> Self {
        Self {
            sp_schema: BTreeMap::new(),
            src_schema: BTreeMap::new(),
            synthetic_keys: HashMap::new(),
            names: crate::names::NameMap::new(),
            mode: Mode::Schema,
            sink: None,
            bad_rows: Vec::new(),
            bad_row_bytes: 0,
            stats: Stats::default(),
            timezone,
            options,
        }
    }

    pub fn options(&self) -> &ConvOptions {
        &self.options
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    // ------------------------------------------------------------------------
    // Mode
    // ------------------------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_schema_mode(&mut self) {
        self.mode = Mode::Schema;
    }

    pub fn set_data_mode(&mut self) {
        self.mode = Mode::Data;
    }

    pub fn schema_mode(&self) -> bool {
        self.mode == Mode::Schema
    }

    pub fn data_mode(&self) -> bool {
        self.mode == Mode::Data
    }

    // ------------------------------------------------------------------------
    // Timezone
    // ------------------------------------------------------------------------

    /// Timezone used for offset-free timestamps.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Replace the active timezone; the last call wins.
    pub fn set_timezone(&mut self, tz: Tz) {
        if tz != self.timezone {
            debug!("Active timezone set to {tz}");
        }
        self.timezone = tz;
    }

    /// Go back to the configured timezone, as at the start of a pass.
    pub fn reset_timezone(&mut self) {
        self.timezone = self.options.tz().unwrap_or(Tz::UTC);
    }

    // ------------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------------

    /// Count a row of a source table (schema mode only).
    pub fn stats_add_row(&mut self, src_table: &str) {
        if self.schema_mode() {
            *self.stats.rows.entry(src_table.to_string()).or_default() += 1;
        }
    }

    /// Count a converted row (data mode only).
    pub fn stats_add_good_row(&mut self, src_table: &str) {
        if self.data_mode() {
            *self.stats.good_rows.entry(src_table.to_string()).or_default() += 1;
        }
    }

    /// Count a rejected row (data mode only).
    pub fn stats_add_bad_row(&mut self, src_table: &str) {
        if self.data_mode() {
            *self.stats.bad_rows.entry(src_table.to_string()).or_default() += 1;
        }
    }

    /// Count a chunk parse retry (schema mode only).
    pub fn stats_add_reparsed(&mut self) {
        if self.schema_mode() {
            self.stats.reparsed += 1;
        }
    }

    /// Count a statement that affected the schema (schema mode only).
    pub fn schema_statement(&mut self, kind: &str) {
        if self.schema_mode() {
            self.stats.statement_mut(kind).schema += 1;
        }
    }

    /// Count a statement that carried data (schema mode only).
    pub fn data_statement(&mut self, kind: &str) {
        if self.schema_mode() {
            self.stats.statement_mut(kind).data += 1;
        }
    }

    /// Count a statement with no effect (schema mode only).
    pub fn skip_statement(&mut self, kind: &str) {
        if self.schema_mode() {
            self.stats.statement_mut(kind).skip += 1;
        }
    }

    /// Count a statement that failed processing (schema mode only).
    pub fn error_in_statement(&mut self, kind: &str) {
        if self.schema_mode() {
            self.stats.statement_mut(kind).error += 1;
        }
    }

    /// Record an unexpected condition.
    ///
    /// Up to `unexpected_cap` distinct messages are tracked; past the cap only
    /// already-known messages are counted. Every call is logged.
    pub fn unexpected(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if let Some(count) = self.stats.unexpected.get_mut(&msg) {
            *count += 1;
            debug!("Unexpected condition (repeat): {msg}");
            return;
        }
        warn!("Unexpected condition: {msg}");
        if self.stats.unexpected.len() < self.options.unexpected_cap {
            self.stats.unexpected.insert(msg, 1);
        }
    }

    // ------------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------------

    /// Install the row sink used in data mode.
    pub fn set_sink(&mut self, sink: impl RowSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Forward a converted row to the sink (data mode only).
    pub fn write_row(&mut self, row: Row) {
        if !self.data_mode() {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.consume(row);
        }
    }

    /// Keep a failed row for diagnostics, within the byte budget.
    ///
    /// The first bad row is always kept, even if it alone exceeds the budget.
    pub fn collect_bad_row(&mut self, table: &str, columns: &[String], values: &[String]) {
        let row = BadRow {
            table: table.to_string(),
            columns: columns.to_vec(),
            values: values.to_vec(),
        };
        let size = row.byte_size();
        if self.bad_rows.is_empty() || self.bad_row_bytes + size <= self.options.bad_row_byte_budget
        {
            self.bad_row_bytes += size;
            self.bad_rows.push(row);
        }
    }

    /// Up to `n` bad rows formatted for display.
    pub fn sample_bad_rows(&self, n: usize) -> Vec<String> {
        self.bad_rows.iter().take(n).map(BadRow::to_string).collect()
    }

    pub fn bad_rows(&self) -> &[BadRow] {
        &self.bad_rows
    }

    // ------------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------------

    /// Give every target table without a primary key a synthetic one.
    ///
    /// Runs between the passes, since primary keys usually arrive through
    /// `ALTER TABLE` statements after the `CREATE TABLE`.
    pub fn add_primary_keys(&mut self) {
        let base = self.options.synthetic_key_column.clone();
        for (name, table) in self.sp_schema.iter_mut() {
            if !table.primary_keys.is_empty() {
                continue;
            }
            let mut column = base.clone();
            let mut n = 0;
            while table.has_column_ci(&column) && n <= table.col_names.len() + 1 {
                column = format!("{base}{n}");
                n += 1;
            }
            if table.has_column_ci(&column) {
                warn!("No free name for synthetic key of table '{name}'");
                continue;
            }

            let mut col = TargetColumn::new(column.clone(), TargetType::new(TypeKind::Int64));
            col.not_null = true;
            table.push_column(col);
            table.primary_keys = vec![IndexKey::asc(column.clone())];
            info!("Added synthetic primary key '{column}' to table '{name}'");
            self.synthetic_keys.insert(
                name.clone(),
                SyntheticKey {
                    column,
                    sequence: 0,
                },
            );
        }
    }

    /// Every issue recorded on a source column, in table/column order.
    pub fn issues(&self) -> Vec<ColumnIssue> {
        let mut out = Vec::new();
        for table in self.src_schema.values() {
            for col_name in &table.col_names {
                let Some(col) = table.col_defs.get(col_name) else {
                    continue;
                };
                for issue in &col.issues {
                    out.push(ColumnIssue {
                        table: table.name.clone(),
                        column: col.name.clone(),
                        issue: *issue,
                    });
                }
            }
        }
        out
    }
}
