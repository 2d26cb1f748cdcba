//! Byte-level JSON scanner
//!
//! Walks a buffered reader one token at a time. Values the parser is not
//! interested in are skipped by string-aware brace/bracket counting; values it
//! wants are captured verbatim and handed to `serde_json`.

use crate::error::{ImportError, ImportResult};
use std::io::BufRead;

pub(crate) struct Scanner<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> Scanner<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    /// Bytes consumed so far
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ImportError {
        ImportError::StructuralParse {
            offset: self.offset,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> ImportResult<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        Ok(buf.first().copied())
    }

    fn bump(&mut self) -> ImportResult<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.reader.consume(1);
            self.offset += 1;
        }
        Ok(byte)
    }

    fn bump_required(&mut self, context: &str) -> ImportResult<u8> {
        self.bump()?
            .ok_or_else(|| self.error(format!("unexpected end of input in {}", context)))
    }

    /// Skip whitespace and return the next byte without consuming it
    fn skip_ws(&mut self) -> ImportResult<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\n' | b'\r' | b'\t') => {
                    self.bump()?;
                }
                other => return Ok(other),
            }
        }
    }

    /// Consume `expected` (after optional whitespace) or fail with `context`
    pub(crate) fn expect(&mut self, expected: u8, context: &str) -> ImportResult<()> {
        match self.skip_ws()? {
            Some(byte) if byte == expected => {
                self.bump()?;
                Ok(())
            }
            Some(byte) => Err(self.error(format!(
                "{}: expected '{}', found '{}'",
                context, expected as char, byte as char
            ))),
            None => Err(self.error(format!("{}: unexpected end of input", context))),
        }
    }

    /// Advance to the next entry of an open object or array
    ///
    /// Returns `false` (and consumes `close`) when the container ends.
    pub(crate) fn next_entry(&mut self, close: u8, first: &mut bool) -> ImportResult<bool> {
        let byte = self
            .skip_ws()?
            .ok_or_else(|| self.error("unexpected end of input inside container"))?;

        if byte == close {
            self.bump()?;
            return Ok(false);
        }

        if *first {
            *first = false;
            return Ok(true);
        }

        if byte == b',' {
            self.bump()?;
            return Ok(true);
        }

        Err(self.error(format!(
            "expected ',' or '{}', found '{}'",
            close as char, byte as char
        )))
    }

    /// Read an object key and its ':' separator
    pub(crate) fn read_key(&mut self) -> ImportResult<String> {
        let key = self.read_string()?;
        self.expect(b':', "object entry")?;
        Ok(key)
    }

    /// Read and unescape a string token
    pub(crate) fn read_string(&mut self) -> ImportResult<String> {
        match self.skip_ws()? {
            Some(b'"') => {}
            Some(byte) => {
                return Err(self.error(format!("expected string, found '{}'", byte as char)))
            }
            None => return Err(self.error("expected string, found end of input")),
        }

        let mut raw = Vec::new();
        self.consume_string(Some(&mut raw))?;
        serde_json::from_slice(&raw).map_err(|e| self.error(format!("invalid string: {}", e)))
    }

    /// Copy the next complete value into `out`
    pub(crate) fn capture_value(&mut self, out: &mut Vec<u8>) -> ImportResult<()> {
        self.walk_value(Some(out))
    }

    /// Consume the next complete value without keeping it
    pub(crate) fn skip_value(&mut self) -> ImportResult<()> {
        self.walk_value(None)
    }

    fn walk_value(&mut self, mut sink: Option<&mut Vec<u8>>) -> ImportResult<()> {
        let first = self
            .skip_ws()?
            .ok_or_else(|| self.error("expected value, found end of input"))?;

        match first {
            b'"' => self.consume_string(sink),
            b'{' | b'[' => self.consume_container(sink),
            b',' | b'}' | b']' | b':' => {
                Err(self.error(format!("expected value, found '{}'", first as char)))
            }
            _ => {
                // number, true, false, null
                while let Some(byte) = self.peek()? {
                    if matches!(byte, b',' | b'}' | b']' | b' ' | b'\n' | b'\r' | b'\t') {
                        break;
                    }
                    self.bump()?;
                    if let Some(out) = sink.as_deref_mut() {
                        out.push(byte);
                    }
                }
                Ok(())
            }
        }
    }

    /// Consume a string including both quotes; the opening quote is next
    fn consume_string(&mut self, mut sink: Option<&mut Vec<u8>>) -> ImportResult<()> {
        let quote = self.bump_required("string")?;
        if let Some(out) = sink.as_deref_mut() {
            out.push(quote);
        }

        loop {
            let byte = self.bump_required("string")?;
            if let Some(out) = sink.as_deref_mut() {
                out.push(byte);
            }
            match byte {
                b'\\' => {
                    let escaped = self.bump_required("string escape")?;
                    if let Some(out) = sink.as_deref_mut() {
                        out.push(escaped);
                    }
                }
                b'"' => return Ok(()),
                _ => {}
            }
        }
    }

    /// Consume a balanced object/array; the opening brace or bracket is next
    fn consume_container(&mut self, mut sink: Option<&mut Vec<u8>>) -> ImportResult<()> {
        let mut depth = 0usize;
        let mut in_string = false;

        loop {
            let byte = self.bump_required("nested value")?;
            if let Some(out) = sink.as_deref_mut() {
                out.push(byte);
            }

            if in_string {
                match byte {
                    b'\\' => {
                        let escaped = self.bump_required("string escape")?;
                        if let Some(out) = sink.as_deref_mut() {
                            out.push(escaped);
                        }
                    }
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match byte {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }
}
