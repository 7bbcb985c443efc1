//! Incremental byte-level frame decoder.

use super::events::{FrameLine, FrameParseError, InboundFrame};
use super::parser::{decode_frame, parse_frame_line};

/// Outcome of decoding one complete line.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A frame to reconcile, with the raw line it came from
    Frame { line: String, frame: InboundFrame },
    /// Valid payload with nothing to reconcile (unknown type)
    Ignored { line: String },
    /// Undecodable line; skipped
    Malformed {
        line: String,
        error: FrameParseError,
    },
}

impl Decoded {
    pub fn into_result(self) -> Option<Result<InboundFrame, FrameParseError>> {
        match self {
            Decoded::Frame { frame, .. } => Some(Ok(frame)),
            Decoded::Ignored { .. } => None,
            Decoded::Malformed { error, .. } => Some(Err(error)),
        }
    }
}

/// Counters over everything a decoder has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames: usize,
    pub ignored: usize,
    pub malformed: usize,
}

/// Longest line the decoder buffers before giving up on it.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// Bytes of an overlong line kept for the debug trace.
const PREVIEW_LEN: usize = 200;

/// Accumulates raw transport bytes and yields frames line by line.
///
/// Reads may split a line, or a multi-byte UTF-8 sequence, anywhere. Bytes
/// are buffered until a `\n` arrives, so text is only decoded once a line
/// is whole. A line that outgrows `max_line_len` is reported once as
/// malformed and the rest of it is dropped.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,
    /// Dropping the tail of an overlong line
    discarding: bool,
    max_line_len: usize,
    fallback_id: Option<String>,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            discarding: false,
            max_line_len: MAX_LINE_LEN,
            fallback_id: None,
            stats: DecoderStats::default(),
        }
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_len(mut self, limit: usize) -> Self {
        self.max_line_len = limit;
        self
    }

    /// Bind frames that carry no id to `id`.
    pub fn with_fallback_id(mut self, id: impl Into<String>) -> Self {
        self.fallback_id = Some(id.into());
        self
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Bytes held back waiting for the end of a line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one read of transport bytes, returning every line it completed.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            if self.discarding {
                self.discarding = false;
            } else {
                let line = self.buffer[start..end].to_vec();
                out.extend(self.decode_line(&line));
            }
            start = end + 1;
            self.scanned = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_len {
            if !self.discarding {
                let preview = &self.buffer[..PREVIEW_LEN.min(self.buffer.len())];
                let line = String::from_utf8_lossy(preview).into_owned();
                tracing::warn!("Dropping frame line over {} bytes", self.max_line_len);
                self.stats.malformed += 1;
                out.push(Decoded::Malformed {
                    line,
                    error: FrameParseError::LineTooLong {
                        limit: self.max_line_len,
                    },
                });
                self.discarding = true;
            }
            self.buffer.clear();
            self.scanned = 0;
        }
        out
    }

    /// Flush a trailing line that had no terminating newline.
    pub fn finish(&mut self) -> Option<Decoded> {
        let line = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) || line.is_empty() {
            return None;
        }
        self.decode_line(&line)
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Decoded> {
        let line = String::from_utf8_lossy(raw);
        let data = match parse_frame_line(&line) {
            FrameLine::Data(data) => data,
            FrameLine::Event(_) | FrameLine::Empty | FrameLine::Comment(_) => return None,
        };

        let line = line.trim_end_matches('\r').to_string();
        let decoded = match decode_frame(&data, self.fallback_id.as_deref()) {
            Ok(Some(frame)) => {
                self.stats.frames += 1;
                Decoded::Frame { line, frame }
            }
            Ok(None) => {
                self.stats.ignored += 1;
                tracing::debug!("Ignoring frame without reconcilable type: {}", line);
                Decoded::Ignored { line }
            }
            Err(error) => {
                self.stats.malformed += 1;
                Decoded::Malformed { line, error }
            }
        };
        Some(decoded)
    }
}
