//! Command-line configuration.

pub mod size;

pub use size::parse_byte_size;

use crate::Cli;
use anyhow::Context;
use migrate_core::{parse_timezone, ConvOptions};

/// Conversion options from the optional YAML file, with command-line
/// overrides applied on top.
pub fn conv_options(cli: &Cli) -> anyhow::Result<ConvOptions> {
    let mut options = match &cli.config {
        Some(path) => ConvOptions::from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ConvOptions::default(),
    };
    if let Some(tz) = &cli.timezone {
        if parse_timezone(tz).is_none() {
            anyhow::bail!("Unknown timezone: {tz}");
        }
        options.timezone = tz.clone();
    }
    if let Some(budget) = &cli.bad_row_budget {
        options.bad_row_byte_budget = parse_byte_size(budget)
            .with_context(|| format!("Invalid --bad-row-budget: {budget}"))?;
    }
    Ok(options)
}
