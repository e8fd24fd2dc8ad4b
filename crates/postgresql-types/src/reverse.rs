//! Reverse conversion: PostgreSQL text value → `Value`.
//!
//! Decodes the text representation used by `COPY` payloads and `INSERT`
//! literals into a value of the target column's kind. The source type id is
//! only consulted to pick the timestamp strategy.

use crate::error::{PgValueError, Result};
use crate::timestamp::{parse_timestamp, parse_timestamptz};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use migrate_core::{TargetType, TypeKind, Value};

/// Convert a text value to the target column type, array or scalar.
pub fn convert_value(ty: &TargetType, src_type: &str, tz: &Tz, val: &str) -> Result<Value> {
    if ty.is_array {
        convert_array(ty.kind, src_type, tz, val)
    } else {
        convert_scalar(ty.kind, src_type, tz, val)
    }
}

/// Convert a text value to a scalar of the given kind.
pub fn convert_scalar(kind: TypeKind, src_type: &str, tz: &Tz, val: &str) -> Result<Value> {
    Ok(match kind {
        TypeKind::Bool => Value::Bool(parse_bool(val)?),
        TypeKind::Bytes => Value::Bytes(parse_bytes(val)?),
        TypeKind::Date => Value::Date(parse_date(val)?),
        TypeKind::Float64 => Value::Float64(parse_float(val)?),
        TypeKind::Int64 => Value::Int64(parse_int(val)?),
        TypeKind::String => Value::String(val.to_string()),
        TypeKind::Timestamp => Value::Timestamp(parse_ts(src_type, tz, val)?),
    })
}

/// Convert an array literal such as `{1,2,NULL}` to a typed array.
///
/// The literal must be wrapped in `{` `}`. Elements are split on commas
/// outside double quotes; nested arrays and composites are not understood.
pub fn convert_array(kind: TypeKind, src_type: &str, tz: &Tz, val: &str) -> Result<Value> {
    let elements = split_array(val)?;
    Ok(match kind {
        TypeKind::Bool => Value::BoolArray(decode_elements(&elements, parse_bool)?),
        TypeKind::Bytes => Value::BytesArray(decode_elements(&elements, parse_bytes)?),
        TypeKind::Date => Value::DateArray(decode_elements(&elements, parse_date)?),
        TypeKind::Float64 => Value::Float64Array(decode_elements(&elements, parse_float)?),
        TypeKind::Int64 => Value::Int64Array(decode_elements(&elements, parse_int)?),
        TypeKind::String => {
            Value::StringArray(decode_elements(&elements, |s| Ok(s.to_string()))?)
        }
        TypeKind::Timestamp => Value::TimestampArray(decode_elements(&elements, |s| {
            parse_ts(src_type, tz, s)
        })?),
    })
}

fn decode_elements<T>(
    elements: &[Option<String>],
    decode: impl Fn(&str) -> Result<T>,
) -> Result<Vec<Option<T>>> {
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            None => Ok(None),
            Some(s) => decode(s)
                .map(Some)
                .map_err(|e| PgValueError::InvalidArrayElement {
                    index,
                    source: Box::new(e),
                }),
        })
        .collect()
}

/// Split an array literal into elements; `None` is a `NULL` element.
fn split_array(val: &str) -> Result<Vec<Option<String>>> {
    let trimmed = val.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| PgValueError::InvalidArrayDelimiters(val.to_string()))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut elements = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                was_quoted = true;
            }
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' if !quoted => {
                elements.push(finish_element(&current, was_quoted));
                current.clear();
                was_quoted = false;
            }
            _ => current.push(c),
        }
    }
    elements.push(finish_element(&current, was_quoted));
    Ok(elements)
}

fn finish_element(raw: &str, was_quoted: bool) -> Option<String> {
    if was_quoted {
        return Some(raw.to_string());
    }
    let s = raw.trim();
    if s.eq_ignore_ascii_case("NULL") {
        None
    } else {
        Some(s.to_string())
    }
}

// ============================================================================
// Scalar decoders
// ============================================================================

fn parse_bool(s: &str) -> Result<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(PgValueError::InvalidBool(s.to_string())),
    }
}

fn parse_bytes(s: &str) -> Result<Vec<u8>> {
    let hex_str = s
        .strip_prefix("\\x")
        .ok_or_else(|| PgValueError::MissingBytesPrefix(s.to_string()))?;
    hex::decode(hex_str).map_err(|e| PgValueError::InvalidHex(e.to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| PgValueError::InvalidDate(s.to_string()))
}

fn parse_float(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| PgValueError::InvalidFloat(s.to_string()))
}

fn parse_int(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| PgValueError::InvalidInt(s.to_string()))
}

fn parse_ts(src_type: &str, tz: &Tz, s: &str) -> Result<DateTime<Utc>> {
    if crate::canonical_type_id(src_type) == "timestamp" {
        parse_timestamp(s, tz)
    } else {
        parse_timestamptz(s, tz)
    }
}
