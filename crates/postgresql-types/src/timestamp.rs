//! PostgreSQL timestamp text decoding.
//!
//! `pg_dump` writes `timestamptz` values as `2024-01-15 10:30:00+00` (hour-only
//! offset) or `... +05:30` (hour:minute offset), and `timestamp` values without
//! any offset. Strategies are tried in that order, first success wins.

use crate::error::{PgValueError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_TIME_OFFSET: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Parse a `timestamptz` value.
///
/// Values without an offset are interpreted in `tz`.
pub fn parse_timestamptz(s: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Some(normalized) = normalize_hour_offset(s) {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, DATE_TIME_OFFSET) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_str(s, DATE_TIME_OFFSET) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, DATE_TIME)
        .map_err(|_| PgValueError::InvalidTimestamp(s.to_string()))?;
    localize(naive, tz, s)
}

/// Parse a `timestamp` (without time zone) value.
///
/// Only the offset-free form is parsed and localised in `tz`. A trailing
/// offset is tolerated but ignored, so the wall-clock value is kept as written.
pub fn parse_timestamp(s: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    let (naive, rest) = NaiveDateTime::parse_and_remainder(s, DATE_TIME)
        .map_err(|_| PgValueError::InvalidTimestamp(s.to_string()))?;
    if !rest.is_empty() && !is_offset(rest) {
        return Err(PgValueError::InvalidTimestamp(s.to_string()));
    }
    localize(naive, tz, s)
}

fn localize(naive: NaiveDateTime, tz: &Tz, raw: &str) -> Result<DateTime<Utc>> {
    // Ambiguous (DST overlap) resolves to the earlier instant; a gap has none.
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| PgValueError::NonexistentLocalTime {
            value: raw.to_string(),
            timezone: tz.to_string(),
        })
}

/// `+HH` / `-HH` at the end becomes `+HH:00` / `-HH:00`.
fn normalize_hour_offset(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let tail = &bytes[bytes.len() - 3..];
    let sign_ok = tail[0] == b'+' || tail[0] == b'-';
    let digits_ok = tail[1].is_ascii_digit() && tail[2].is_ascii_digit();
    let before_ok = bytes[bytes.len() - 4].is_ascii_digit();
    (sign_ok && digits_ok && before_ok).then(|| format!("{s}:00"))
}

/// `+HH`, `+HHMM` or `+HH:MM`, with either sign.
fn is_offset(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('+').or_else(|| s.strip_prefix('-')) else {
        return false;
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    matches!(digits.len(), 2 | 4)
        && digits.chars().all(|c| c.is_ascii_digit())
        && rest.chars().filter(|c| *c == ':').count() <= 1
}
