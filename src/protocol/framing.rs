//! Newline-delimited frame reassembly and validation
//!
//! Producers send one JSON document per line. A frame is complete at each
//! `\n` byte; there is no length prefix. A document with an embedded
//! newline before its terminator is therefore cut short; that is the
//! protocol, not a parser bug. Partial reads accumulate until a terminator
//! arrives.

use bytes::{Buf, Bytes, BytesMut};

/// Reassembles newline-terminated frames from a raw byte stream.
///
/// Feed chunks in with [`push`](Self::push) and drain completed frames with
/// [`next_frame`](Self::next_frame). Bytes after the last terminator stay
/// buffered for the next read.
#[derive(Debug)]
pub struct FrameAccumulator {
    buf: BytesMut,
    max_frame_size: usize,
}

impl FrameAccumulator {
    /// Create an accumulator that rejects frames larger than `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            max_frame_size,
        }
    }

    /// Append raw bytes received from the socket.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete frame, without its trailing newline.
    ///
    /// Returns `None` when no terminator is buffered yet.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut frame = self.buf.split_to(pos + 1);
        frame.truncate(pos); // drop the terminator
        Some(frame.freeze())
    }

    /// Number of bytes buffered without a terminator.
    pub fn pending(&self) -> usize {
        self.buf.remaining()
    }

    /// True once the unterminated tail has outgrown the frame size limit.
    ///
    /// The caller should treat this as a connection error: without the
    /// check, a producer that never sends a newline grows the buffer
    /// without bound.
    pub fn over_limit(&self) -> bool {
        self.buf.len() > self.max_frame_size
    }

    /// Configured frame size limit.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

/// Why a completed frame was rejected
#[derive(Debug)]
pub enum FrameError {
    /// Frame bytes are not valid UTF-8
    InvalidUtf8,
    /// Frame text is not a valid JSON document
    InvalidJson(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::InvalidUtf8 => write!(f, "frame is not valid UTF-8"),
            FrameError::InvalidJson(e) => write!(f, "frame is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

/// Validate a completed frame and return its text.
///
/// A frame is valid iff it decodes as UTF-8 and parses as one syntactically
/// valid JSON document. No schema is applied; the parsed value is discarded
/// and the raw text is what flows through the pipeline.
pub fn validate_frame(frame: &[u8]) -> Result<&str, FrameError> {
    let text = std::str::from_utf8(frame).map_err(|_| FrameError::InvalidUtf8)?;
    serde_json::from_str::<serde::de::IgnoredAny>(text)
        .map_err(|e| FrameError::InvalidJson(e.to_string()))?;
    Ok(text)
}
