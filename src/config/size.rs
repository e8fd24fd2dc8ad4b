//! Byte size parsing utilities.

use anyhow::Context;

/// Parse a size string like "10MB", "512KB", "1GB", "4096B" or "4096" into bytes.
/// Supports:
/// - Plain numbers (interpreted as bytes): "4096"
/// - Bytes suffix: "4096B"
/// - Kilobytes suffix: "512KB" or "512K"
/// - Megabytes suffix: "10MB" or "10M"
/// - Gigabytes suffix: "1GB" or "1G"
///
/// Suffixes are case-insensitive and use powers of 1024.
pub fn parse_byte_size(s: &str) -> anyhow::Result<usize> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty size string");
    }
    let upper = s.to_ascii_uppercase();

    for (suffixes, multiplier) in [
        (["GB", "G"], 1024 * 1024 * 1024),
        (["MB", "M"], 1024 * 1024),
        (["KB", "K"], 1024),
    ] {
        for suffix in suffixes {
            if let Some(num_str) = upper.strip_suffix(suffix) {
                let n: usize = num_str
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid size value: {s}"))?;
                return n
                    .checked_mul(multiplier)
                    .with_context(|| format!("Size too large: {s}"));
            }
        }
    }

    // No unit suffix - treat as bytes
    let num_str = upper.strip_suffix('B').unwrap_or(&upper);
    num_str
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid size value: {s}"))
}
