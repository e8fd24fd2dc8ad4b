//! PostgreSQL dump ingestion for spanner-migrate.
//!
//! This crate reads `pg_dump` plain-text output and drives a [`Conv`] through
//! two passes over the same input:
//!
//! 1. **Schema pass** - build the source and target schemas and count rows
//! 2. **Data pass** - convert every `COPY`/`INSERT` row and hand it to the
//!    configured [`migrate_core::RowSink`]
//!
//! Synthetic primary keys are added between the passes.
//!
//! # Example
//!
//! ```rust
//! use migrate_core::{Conv, RowCollector};
//! use std::io::Cursor;
//!
//! let dump = "CREATE TABLE t (id int8, name text);\n\
//!             ALTER TABLE t ADD CONSTRAINT t_pkey PRIMARY KEY (id);\n\
//!             COPY t (id, name) FROM stdin;\n\
//!             1\tAda\n\
//!             \\.\n";
//!
//! let rows = RowCollector::new();
//! let mut conv = Conv::default();
//! conv.set_sink(rows.clone());
//! postgresql_dump::convert(&mut conv, || Ok(Cursor::new(dump))).unwrap();
//!
//! assert_eq!(rows.len(), 1);
//! ```

pub mod chunk;
pub mod copy;
pub mod data;
pub mod error;
pub mod insert;
pub mod reader;
pub mod schema;
pub mod statement;

pub use copy::parse_copy_line;
pub use data::{convert_row, process_row, synthetic_key_value, RowTarget};
pub use error::{DumpError, Result, StatementError};
pub use reader::DumpReader;
pub use schema::{process_statement, Directive};
pub use statement::DumpStatement;

use chunk::next_chunk;
use copy::process_copy;
use migrate_core::Conv;
use std::io::{self, BufRead};
use tracing::{info, warn};

/// Run both passes over a dump.
///
/// `open` is called once per pass and must yield the dump from its start.
pub fn convert<R, F>(conv: &mut Conv, mut open: F) -> Result<()>
where
    R: BufRead,
    F: FnMut() -> io::Result<R>,
{
    build_schema(conv, open()?)?;
    convert_data(conv, open()?)
}

/// Schema pass: build both schemas, count rows, then add synthetic keys.
pub fn build_schema<R: BufRead>(conv: &mut Conv, input: R) -> Result<()> {
    conv.set_schema_mode();
    conv.reset_timezone();
    info!("Starting schema pass");
    let mut reader = DumpReader::new(input);
    process_dump(conv, &mut reader)?;
    conv.add_primary_keys();
    info!(
        "Schema pass complete: {} tables, {} rows, {} lines",
        conv.sp_schema.len(),
        conv.stats().total_rows(),
        reader.line_number()
    );
    Ok(())
}

/// Data pass: convert rows and send them to the sink.
pub fn convert_data<R: BufRead>(conv: &mut Conv, input: R) -> Result<()> {
    conv.set_data_mode();
    conv.reset_timezone();
    info!("Starting data pass");
    let mut reader = DumpReader::new(input);
    process_dump(conv, &mut reader)?;
    let stats = conv.stats();
    info!(
        "Data pass complete: {} good rows, {} bad rows",
        stats.total_good_rows(),
        stats.total_bad_rows()
    );
    Ok(())
}

/// Process every statement of a dump in the current mode.
pub fn process_dump<R: BufRead>(conv: &mut Conv, reader: &mut DumpReader<R>) -> Result<()> {
    while let Some(chunk) = next_chunk(conv, reader)? {
        let count = chunk.statements.len();
        for (i, stmt) in chunk.statements.into_iter().enumerate() {
            match process_statement(conv, DumpStatement::from(stmt)) {
                Some(Directive::Copy(target)) => {
                    if i + 1 < count {
                        warn!(
                            "COPY followed by {} statements in one chunk at line {}; discarding them",
                            count - i - 1,
                            reader.line_number()
                        );
                        if conv.schema_mode() {
                            conv.unexpected("COPY is not the last statement in its chunk");
                        }
                    }
                    process_copy(conv, reader, target.as_ref())?;
                    break;
                }
                Some(Directive::Rows { target, rows }) => {
                    for row in &rows {
                        if conv.schema_mode() {
                            conv.stats_add_row(&target.src_table);
                        } else {
                            process_row(conv, &target, row);
                        }
                    }
                }
                None => {}
            }
        }
    }
    Ok(())
}
