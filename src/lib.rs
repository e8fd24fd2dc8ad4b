//! spanner-migrate library
//!
//! Converts a PostgreSQL plain-text dump (`pg_dump` output) into a Cloud
//! Spanner schema and a stream of typed rows.
//!
//! # Crates
//!
//! - `migrate_core` - Spanner types, conversion state, identifier mapping, DDL
//! - `postgresql_types` - PostgreSQL type mapping and value decoding
//! - `postgresql_dump` - Dump reader, statement classifier and row converter
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the Spanner DDL for a dump
//! spanner-migrate --dump backup.sql --schema-only
//!
//! # Convert schema and data, writing rows and statistics
//! spanner-migrate --dump backup.sql --rows-out rows.jsonl --emit-stats stats.json
//!
//! # Read the dump from stdin
//! pg_dump mydb | spanner-migrate --dump - --timezone America/New_York
//! ```

use anyhow::Context;
use clap::Parser;
use migrate_core::{Conv, SpannerDdl};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};

pub mod config;
pub mod output;

pub use output::{JsonLinesSink, Report};

#[derive(Parser, Debug, Clone)]
#[command(name = "spanner-migrate")]
#[command(about = "A tool for migrating PostgreSQL dumps to Cloud Spanner")]
#[command(long_about = None)]
pub struct Cli {
    /// PostgreSQL plain-text dump to read ("-" for stdin)
    #[arg(long, env = "SPANNER_MIGRATE_DUMP")]
    pub dump: String,

    /// Build and print the schema only; skip the data pass
    #[arg(long)]
    pub schema_only: bool,

    /// Write converted rows as JSON lines to this file
    #[arg(long, value_name = "PATH", env = "SPANNER_MIGRATE_ROWS_OUT")]
    pub rows_out: Option<PathBuf>,

    /// Write conversion statistics and issues as JSON to this file
    #[arg(long, value_name = "PATH", env = "SPANNER_MIGRATE_EMIT_STATS")]
    pub emit_stats: Option<PathBuf>,

    /// Timezone for timestamps without an offset, until the dump sets one
    #[arg(long, env = "SPANNER_MIGRATE_TIMEZONE")]
    pub timezone: Option<String>,

    /// Memory budget for bad-row samples (e.g. "10MB", "512KB", "4096")
    #[arg(long, env = "SPANNER_MIGRATE_BAD_ROW_BUDGET")]
    pub bad_row_budget: Option<String>,

    /// Number of bad rows to log and include in the statistics
    #[arg(long, default_value_t = 10, env = "SPANNER_MIGRATE_BAD_ROW_SAMPLES")]
    pub bad_row_samples: usize,

    /// YAML file with conversion options
    #[arg(long, value_name = "PATH", env = "SPANNER_MIGRATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Quote every identifier in the generated DDL (reserved keywords are
    /// always quoted)
    #[arg(long)]
    pub quote_identifiers: bool,

    /// Log per-statement diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run a migration, writing the DDL to `ddl_out`.
///
/// Returns the final conversion state for inspection.
pub fn run(cli: &Cli, ddl_out: &mut dyn Write) -> anyhow::Result<Conv> {
    let options = config::conv_options(cli)?;
    let mut conv = Conv::new(options).context("Invalid conversion options")?;

    let sink = match &cli.rows_out {
        Some(path) => Some(JsonLinesSink::create(path)?),
        None => None,
    };
    if let Some(sink) = &sink {
        conv.set_sink(sink.clone());
    }

    let mut open = dump_opener(&cli.dump)?;
    if cli.schema_only {
        postgresql_dump::build_schema(&mut conv, open()?)
            .with_context(|| format!("Failed to read dump {}", cli.dump))?;
    } else {
        postgresql_dump::convert(&mut conv, open)
            .with_context(|| format!("Failed to read dump {}", cli.dump))?;
    }

    if let Some(sink) = &sink {
        let rows = sink.finish()?;
        info!("Wrote {rows} rows");
    }

    let ddl = SpannerDdl::new(cli.quote_identifiers);
    for statement in ddl.schema_statements(&conv.sp_schema) {
        writeln!(ddl_out, "{statement};\n").context("Failed to write DDL")?;
    }

    for sample in conv.sample_bad_rows(cli.bad_row_samples) {
        warn!("Bad row: {sample}");
    }
    if let Some(path) = &cli.emit_stats {
        Report::new(&conv, cli.bad_row_samples).write_to(path)?;
    }
    Ok(conv)
}

/// A function that opens the dump from its start, once per pass.
///
/// Stdin cannot be rewound, so it is read into memory up front.
fn dump_opener(
    dump: &str,
) -> anyhow::Result<impl FnMut() -> io::Result<Box<dyn BufRead>>> {
    let buffered = if dump == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("Failed to read dump from stdin")?;
        Some(buf)
    } else {
        None
    };
    let path = PathBuf::from(dump);
    Ok(move || -> io::Result<Box<dyn BufRead>> {
        match &buffered {
            Some(buf) => Ok(Box::new(Cursor::new(buf.clone()))),
            None => Ok(Box::new(BufReader::new(File::open(&path)?))),
        }
    })
}
