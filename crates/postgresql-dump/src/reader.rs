//! Line reader over a dump stream.

use std::io::{self, BufRead};

/// Reads a dump line by line, tracking position for diagnostics.
///
/// Invalid UTF-8 is replaced rather than rejected, so a stray byte in one
/// value cannot stop the run.
#[derive(Debug)]
pub struct DumpReader<R> {
    inner: R,
    line_number: usize,
    offset: u64,
    eof: bool,
    buf: Vec<u8>,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_number: 0,
            offset: 0,
            eof: false,
            buf: Vec::new(),
        }
    }

    /// Read the next line, including its trailing newline if present.
    ///
    /// At end of input this returns an empty string and sets [`Self::eof`].
    /// A final line without a newline is returned with `eof` already set.
    pub fn read_line(&mut self) -> io::Result<String> {
        if self.eof {
            return Ok(String::new());
        }
        self.buf.clear();
        let n = self.inner.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            self.eof = true;
            return Ok(String::new());
        }
        self.line_number += 1;
        self.offset += n as u64;
        if self.buf.last() != Some(&b'\n') {
            self.eof = true;
        }
        Ok(String::from_utf8_lossy(&self.buf).into_owned())
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn eof(&self) -> bool {
        self.eof
    }
}
