//! Command-line interface for spanner-migrate
//!
//! # Usage Examples
//!
//! ```bash
//! # Schema only: print Spanner DDL for a dump
//! spanner-migrate --dump backup.sql --schema-only
//!
//! # Schema and data
//! spanner-migrate --dump backup.sql \
//!   --rows-out rows.jsonl \
//!   --emit-stats stats.json \
//!   --bad-row-budget 1MB
//!
//! # Options from a YAML file, dump from stdin
//! pg_dump --no-owner mydb | spanner-migrate --dump - --config migrate.yaml
//! ```
//!
//! DDL goes to stdout; logs go to stderr and follow `RUST_LOG`.

use clap::Parser;
use spanner_migrate::Cli;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = spanner_migrate::run(&cli, &mut out) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
