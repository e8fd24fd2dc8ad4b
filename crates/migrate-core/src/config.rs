//! Conversion options.
//!
//! Options can be built in code, loaded from a YAML file, or filled from CLI
//! flags by the binary. Every field has a default, so a YAML file only needs to
//! name what it changes:
//!
//! ```yaml
//! bad_row_byte_budget: 1048576
//! timezone: America/New_York
//! ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default byte budget for bad-row samples (10 MB).
pub const DEFAULT_BAD_ROW_BYTE_BUDGET: usize = 10 * 1024 * 1024;

/// Default cap on distinct unexpected-condition keys.
pub const DEFAULT_UNEXPECTED_CAP: usize = 1000;

/// Default base name for synthesized primary key columns.
pub const DEFAULT_SYNTHETIC_KEY_COLUMN: &str = "synth_id";

/// Error type for option loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Tunables for a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvOptions {
    /// Bytes of bad-row samples kept; at least one row is always kept
    pub bad_row_byte_budget: usize,

    /// Distinct unexpected-condition keys tracked before new keys are dropped
    pub unexpected_cap: usize,

    /// Active timezone before any `SET timezone` statement
    pub timezone: String,

    /// Base name for synthesized primary key columns
    pub synthetic_key_column: String,
}

impl Default for ConvOptions {
    fn default() -> Self {
        Self {
            bad_row_byte_budget: DEFAULT_BAD_ROW_BYTE_BUDGET,
            unexpected_cap: DEFAULT_UNEXPECTED_CAP,
            timezone: "UTC".to_string(),
            synthetic_key_column: DEFAULT_SYNTHETIC_KEY_COLUMN.to_string(),
        }
    }
}

impl ConvOptions {
    /// Load options from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(yaml)?;
        options.tz()?;
        Ok(options)
    }

    /// The configured initial timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.timezone)
            .ok_or_else(|| ConfigError::UnknownTimezone(self.timezone.clone()))
    }
}

/// Resolve a timezone name: `UTC`/`GMT` in any case, otherwise an IANA name.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("utc") || name.eq_ignore_ascii_case("gmt") {
        return Some(Tz::UTC);
    }
    name.parse::<Tz>().ok()
}
