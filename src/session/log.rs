//! Session log writer
//!
//! Every validated record is appended, one JSON document per line, to a
//! file named for the producer identity and the connection's start time.
//! The file (and its containing directory) is created lazily on the first
//! record, so a connection that never sends a valid frame leaves nothing
//! on disk. Writes for one identity are serialized by the owning
//! connection task; different identities write to different files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::registry::ProducerId;

/// Append-only log for one connection attempt
pub struct SessionLogWriter {
    path: PathBuf,
    file: Option<File>,
}

impl SessionLogWriter {
    /// Plan a log file for a connection attempt.
    ///
    /// Nothing touches the filesystem until the first [`append`](Self::append).
    pub fn new(log_dir: &Path, id: &ProducerId, started_at: DateTime<Local>) -> Self {
        let name = format!(
            "telemetry_{}_{}.log",
            started_at.format("%Y%m%d_%H%M%S"),
            file_token(id),
        );

        Self {
            path: log_dir.join(name),
            file: None,
        }
    }

    /// Path the log is (or will be) written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a line of text.
    ///
    /// Creates the directory and file on first use.
    pub async fn append(&mut self, record: &str) -> std::io::Result<()> {
        if self.file.is_none() {
            if let Some(dir) = self.path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            self.file = Some(file);
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(record.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        Ok(())
    }

    /// Flush buffered writes to the OS.
    ///
    /// Dropping the writer closes the file either way; this exists for
    /// callers that want the data durable before the connection ends.
    pub async fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush().await?;
        }
        Ok(())
    }
}

/// Identity rendered safe for a file name (IPv6 colons become dashes)
fn file_token(id: &ProducerId) -> String {
    id.to_string().replace(':', "-")
}
