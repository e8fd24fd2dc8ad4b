//! COPY text-format payload.
//!
//! This module reads the lines that follow `COPY ... FROM stdin;` up to the
//! `\.` terminator and decodes each one into fields. Schema mode only counts
//! the rows; data mode converts them.

use crate::data::{process_row, RowTarget};
use crate::error::Result;
use crate::reader::DumpReader;
use migrate_core::Conv;
use std::io::BufRead;
use tracing::debug;

/// Line that ends a COPY payload.
pub const END_OF_COPY: &str = "\\.";

/// Consume a COPY payload from `reader`.
///
/// With no target the payload is read and discarded, so the statements
/// after it stay in sync.
pub fn process_copy<R: BufRead>(
    conv: &mut Conv,
    reader: &mut DumpReader<R>,
    target: Option<&RowTarget>,
) -> Result<()> {
    let mut lines = 0usize;
    loop {
        let line = reader.read_line()?;
        let line = line.trim_end_matches(['\n', '\r']);
        if line == END_OF_COPY {
            break;
        }
        if line.is_empty() && reader.eof() {
            debug!("COPY payload ended without terminator");
            break;
        }
        lines += 1;

        let Some(target) = target else {
            continue;
        };
        if conv.schema_mode() {
            conv.stats_add_row(&target.src_table);
        } else {
            let values = parse_copy_line(line);
            process_row(conv, target, &values);
        }
        if reader.eof() {
            break;
        }
    }
    debug!(
        "Read {lines} COPY lines for {}",
        target.map_or("<discarded>", |t| t.src_table.as_str())
    );
    Ok(())
}

/// Split a text-format COPY line into fields; `\N` is NULL.
pub fn parse_copy_line(line: &str) -> Vec<Option<String>> {
    line.split('\t')
        .map(|field| (field != "\\N").then(|| unescape(field)))
        .collect()
}

/// Undo COPY text escaping.
///
/// Octal and hex escapes produce raw bytes, so the field is decoded as
/// UTF-8 at the end.
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' || i + 1 == bytes.len() {
            out.push(b);
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        i += 2;
        match next {
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut digits = 1;
                while digits < 3 && i < bytes.len() && matches!(bytes[i], b'0'..=b'7') {
                    value = value * 8 + u32::from(bytes[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                out.push((value & 0xff) as u8);
            }
            b'x' if i < bytes.len() && bytes[i].is_ascii_hexdigit() => {
                let mut value = 0u8;
                let mut digits = 0;
                while digits < 2 && i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                    value = value * 16 + hex_digit(bytes[i]);
                    i += 1;
                    digits += 1;
                }
                out.push(value);
            }
            // `\\` and any other escaped character stand for themselves
            other => out.push(other),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_parse_copy_line() {
        assert_eq!(parse_copy_line("1\tAda"), vec![s("1"), s("Ada")]);
        assert_eq!(parse_copy_line("1\t\\N\t"), vec![s("1"), None, s("")]);
        assert_eq!(parse_copy_line("\\\\N"), vec![s("\\N")]);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\tb\\nc\\\\d"), "a\tb\nc\\d");
        assert_eq!(unescape("\\101\\x42"), "AB");
        assert_eq!(unescape("\\303\\251"), "é");
        assert_eq!(unescape("\\x4g"), "\u{4}g");
        assert_eq!(unescape("trailing\\"), "trailing\\");
        assert_eq!(unescape("\\xz"), "xz");
    }

    #[test]
    fn test_bytea_field_keeps_prefix() {
        // bytea in text COPY is written as \\x...
        assert_eq!(parse_copy_line("\\\\xdeadbeef"), vec![s("\\xdeadbeef")]);
    }

    #[test]
    fn test_discarded_payload_leaves_reader_after_terminator() {
        let mut conv = Conv::default();
        let mut reader = DumpReader::new(Cursor::new("1\ta\n2\tb\n\\.\nSET a = 1;\n"));
        process_copy(&mut conv, &mut reader, None).unwrap();
        assert_eq!(reader.line_number(), 3);
        assert_eq!(reader.read_line().unwrap(), "SET a = 1;\n");
    }

    #[test]
    fn test_schema_mode_counts_rows() {
        let mut conv = Conv::default();
        let target = RowTarget {
            src_table: "t".into(),
            sp_table: "t".into(),
            src_cols: vec!["a".into()],
            sp_cols: vec!["a".into()],
        };
        let mut reader = DumpReader::new(Cursor::new("1\r\n2\n3"));
        process_copy(&mut conv, &mut reader, Some(&target)).unwrap();
        assert_eq!(conv.stats().rows["t"], 3);
    }
}
