//! Capacity-bounded text output.
//!
//! Every formatter in this crate writes through a [`TextSink`]. A sink either
//! wraps a caller-owned byte buffer or has no buffer at all (a size query).
//! Once a write does not fit, the sink keeps the bytes that did fit, stops
//! writing, and keeps counting, so [`TextSink::required_length`] is always
//! the length of the complete output.

use std::fmt;

use crate::error::{CodecError, Result};

#[derive(Debug)]
pub struct TextSink<'a> {
    buffer: Option<&'a mut [u8]>,
    written: usize,
    required: usize,
    truncated: bool,
}

impl TextSink<'static> {
    /// A sink with no buffer that only measures.
    pub fn query() -> Self {
        TextSink {
            buffer: None,
            written: 0,
            required: 0,
            truncated: false,
        }
    }
}

impl<'a> TextSink<'a> {
    /// A sink writing into `buffer`; its capacity is `buffer.len()`.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        TextSink {
            buffer: Some(buffer),
            written: 0,
            required: 0,
            truncated: false,
        }
    }

    /// `None` for a size query.
    pub fn capacity(&self) -> Option<usize> {
        self.buffer.as_ref().map(|b| b.len())
    }

    /// Total length of everything pushed so far, written or not.
    pub fn required_length(&self) -> usize {
        self.required
    }

    /// Number of bytes actually stored in the buffer.
    pub fn written_len(&self) -> usize {
        self.written
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The stored prefix of the output.
    pub fn written(&self) -> &[u8] {
        match &self.buffer {
            Some(buf) => &buf[..self.written],
            None => &[],
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.required += s.len();
        if self.truncated {
            return;
        }
        let Some(buf) = self.buffer.as_deref_mut() else {
            return;
        };
        let room = buf.len() - self.written;
        let n = s.len().min(room);
        buf[self.written..self.written + n].copy_from_slice(&s.as_bytes()[..n]);
        self.written += n;
        if n < s.len() {
            self.truncated = true;
        }
    }

    pub fn push_display<T: fmt::Display + ?Sized>(&mut self, value: &T) -> Result<()> {
        fmt::Write::write_fmt(self, format_args!("{}", value))?;
        Ok(())
    }

    /// The full output length, or `OutputTruncated` carrying it when the
    /// buffer was too small.
    pub fn finish(&self) -> Result<usize> {
        if self.truncated {
            Err(CodecError::OutputTruncated {
                required: self.required,
                written: self.written,
            })
        } else {
            Ok(self.required)
        }
    }
}

impl fmt::Write for TextSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

/// A value with a textual form produced through a [`TextSink`].
///
/// `required_length` and `write_into` share `write_text`, so a size query
/// always agrees with a real write.
pub trait FormatText {
    fn write_text(&self, sink: &mut TextSink<'_>) -> Result<()>;

    fn required_length(&self) -> Result<usize> {
        let mut sink = TextSink::query();
        self.write_text(&mut sink)?;
        sink.finish()
    }

    /// Writes as much as fits into `buffer`. On truncation the error carries
    /// the full required length.
    fn write_into(&self, buffer: &mut [u8]) -> Result<usize> {
        let mut sink = TextSink::new(buffer);
        self.write_text(&mut sink)?;
        sink.finish()
    }

    /// Sizes, allocates and fills a `String`.
    fn to_text(&self) -> Result<String> {
        let mut buf = vec![0u8; self.required_length()?];
        let n = self.write_into(&mut buf)?;
        buf.truncate(n);
        String::from_utf8(buf).map_err(|_| CodecError::Format(fmt::Error))
    }
}
