//! Output writers: converted rows as JSON lines and the conversion report.

use anyhow::Context;
use migrate_core::{ColumnIssue, Conv, Row, RowSink, Stats, SyntheticKey};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

struct SinkState {
    writer: Box<dyn Write>,
    rows: u64,
    error: Option<io::Error>,
}

/// Row sink writing one JSON object per line.
///
/// Clones share the writer, so a handle kept by the caller can flush it and
/// collect the first write error after the sink was handed to a [`Conv`].
#[derive(Clone)]
pub struct JsonLinesSink {
    state: Rc<RefCell<SinkState>>,
}

impl JsonLinesSink {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SinkState {
                writer,
                rows: 0,
                error: None,
            })),
        }
    }

    /// Create (or truncate) a file for the rows.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create rows file {}", path.display()))?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    /// Flush the writer and report the number of rows written, or the first
    /// error hit while writing.
    pub fn finish(&self) -> anyhow::Result<u64> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.error.take() {
            return Err(e).context("Failed to write rows");
        }
        state.writer.flush().context("Failed to flush rows")?;
        Ok(state.rows)
    }
}

impl RowSink for JsonLinesSink {
    fn consume(&mut self, row: Row) {
        let mut state = self.state.borrow_mut();
        if state.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut state.writer, &row)
            .map_err(io::Error::from)
            .and_then(|_| state.writer.write_all(b"\n"));
        match result {
            Ok(()) => state.rows += 1,
            Err(e) => state.error = Some(e),
        }
    }
}

/// Everything the external reporter needs, as one JSON document.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub stats: &'a Stats,
    pub issues: Vec<ColumnIssue>,
    pub synthetic_keys: BTreeMap<&'a str, &'a SyntheticKey>,
    pub bad_rows: Vec<String>,
}

impl<'a> Report<'a> {
    pub fn new(conv: &'a Conv, bad_row_samples: usize) -> Self {
        Self {
            stats: conv.stats(),
            issues: conv.issues(),
            synthetic_keys: conv
                .synthetic_keys
                .iter()
                .map(|(table, key)| (table.as_str(), key))
                .collect(),
            bad_rows: conv.sample_bad_rows(bad_row_samples),
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create stats file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).context("Failed to write stats")?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrate_core::Value;

    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_lines() {
        let buf = Rc::new(RefCell::new(Vec::new()));
        let mut sink = JsonLinesSink::new(Box::new(Shared(buf.clone())));
        sink.consume(Row::new(
            "t",
            vec!["id".into(), "name".into()],
            vec![Value::Int64(1), Value::String("Ada".into())],
        ));
        sink.consume(Row::new("t", vec!["id".into()], vec![Value::Int64(2)]));
        assert_eq!(sink.finish().unwrap(), 2);

        let text = String::from_utf8(buf.borrow().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"table":"t","columns":["id","name"],"values":[1,"Ada"]}"#,
                r#"{"table":"t","columns":["id"],"values":[2]}"#,
            ]
        );
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_error_surfaces_on_finish() {
        let mut sink = JsonLinesSink::new(Box::new(Broken));
        sink.consume(Row::new("t", vec!["id".into()], vec![Value::Int64(1)]));
        let err = sink.finish().unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
    }
}
