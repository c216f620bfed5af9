//! Per-connection session state
//!
//! Each accepted connection is one session: it owns the append-only log
//! file for the records it validates. A reconnect is a new session with a
//! new file.

pub mod log;

pub use log::SessionLogWriter;
