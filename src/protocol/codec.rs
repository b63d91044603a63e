//! Newline-delimited text codec for the agent stream.
//!
//! Used with [`tokio_util::codec::FramedRead`] on the inbound half and
//! [`tokio_util::codec::FramedWrite`] on the outbound half.
//!
//! # Decoder
//!
//! Unlike [`tokio_util::codec::LinesCodec`], per-line problems are reported as
//! [`InboundLine`] variants instead of errors. `FramedRead` ends the stream
//! after the first decoder error, and a single bad line must not look like a
//! closed connection. Only I/O failures surface as `Err`.
//!
//! # Encoder
//!
//! Outbound strings have any trailing `\n` stripped and are terminated by
//! exactly one `\n`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{AppError, Result};

/// Default maximum inbound line length: 64 KiB.
pub const DEFAULT_MAX_LINE_BYTES: usize = 65_536;

/// One framed unit read from the inbound stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    /// A complete UTF-8 line without its `\n` terminator.
    Text(String),
    /// A line longer than the configured limit; its bytes were discarded.
    Oversized,
    /// A complete line that is not valid UTF-8.
    InvalidUtf8(String),
    /// Bytes left without a terminator when the stream ended.
    Truncated(usize),
}

impl InboundLine {
    /// Short label used in log events for discarded lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Oversized => "oversized",
            Self::InvalidUtf8(_) => "invalid_utf8",
            Self::Truncated(_) => "truncated",
        }
    }
}

/// Line codec with a configurable inbound length limit.
#[derive(Debug)]
pub struct LineCodec {
    max_length: usize,
    /// Offset already scanned for `\n` in the current buffer.
    next_index: usize,
    /// Set while skipping the rest of an oversized line.
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the [`DEFAULT_MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_BYTES)
    }

    /// Create a codec that discards inbound lines longer than `max_length`
    /// bytes (terminator excluded).
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Configured inbound line limit.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = InboundLine;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let read_to = src.len().min(self.max_length.saturating_add(1));
            let newline = src[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    src.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                    return Ok(Some(InboundLine::Oversized));
                }
                (true, None) => {
                    src.advance(read_to);
                    self.next_index = 0;
                    if src.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let mut line = src.split_to(end + 1);
                    line.truncate(end);
                    return Ok(Some(decode_utf8(&line)));
                }
                (false, None) if src.len() > self.max_length => {
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        self.next_index = 0;
        if std::mem::take(&mut self.discarding) {
            src.clear();
            return Ok(Some(InboundLine::Oversized));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let dropped = src.len();
        src.clear();
        Ok(Some(InboundLine::Truncated(dropped)))
    }
}

impl Encoder<String> for LineCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        let line = item.trim_end_matches('\n');
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

fn decode_utf8(raw: &[u8]) -> InboundLine {
    match std::str::from_utf8(raw) {
        Ok(text) => InboundLine::Text(text.to_owned()),
        Err(err) => InboundLine::InvalidUtf8(err.to_string()),
    }
}
