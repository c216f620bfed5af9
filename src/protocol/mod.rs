//! Wire protocol
//!
//! The ingestion wire format is newline-delimited UTF-8 JSON: one document
//! per frame, no length prefix, no handshake. This module owns frame
//! reassembly and validation.

pub mod framing;

pub use framing::{validate_frame, FrameAccumulator, FrameError};
