//! Per-producer registry state
//!
//! One entry per producer identity, holding the attempt sequence, the
//! per-attempt record index, liveness, and the bounded history.

use std::sync::Arc;
use std::time::Instant;

use super::config::RegistryConfig;
use super::history::HistoryBuffer;

/// Sequencing metadata for one validated record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMeta {
    /// Connection-attempt sequence for the producer (0 on first connect)
    pub attempt: u64,
    /// 1-based index of this record within the attempt
    pub index: u64,
}

/// Registry entry for a single producer identity
pub struct ProducerEntry {
    /// Connection-attempt counter; never reset for the process lifetime
    pub attempt: u64,

    /// Records accepted in the current attempt
    pub record_index: u64,

    /// True while the producer's read loop is active
    pub live: bool,

    /// Bounded recent-record history for the current attempt
    pub history: HistoryBuffer,

    /// Payload bytes accepted in the current attempt
    pub bytes_received: u64,

    /// When the current attempt was accepted
    pub connected_at: Instant,
}

impl ProducerEntry {
    /// Create the entry for a first-ever connection (attempt 0)
    pub(super) fn new(config: &RegistryConfig) -> Self {
        Self {
            attempt: 0,
            record_index: 0,
            live: true,
            history: HistoryBuffer::with_capacity(config.history_capacity),
            bytes_received: 0,
            connected_at: Instant::now(),
        }
    }

    /// Reset per-attempt state for a reconnect and advance the attempt
    /// sequence. The prior attempt's history is discarded.
    pub(super) fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.record_index = 0;
        self.live = true;
        self.history.clear();
        self.bytes_received = 0;
        self.connected_at = Instant::now();
    }

    /// Apply one validated record: append to history and advance the index
    pub(super) fn on_record(&mut self, payload: Arc<str>) -> RecordMeta {
        self.bytes_received += payload.len() as u64;
        self.history.push(payload);
        self.record_index += 1;

        RecordMeta {
            attempt: self.attempt,
            index: self.record_index,
        }
    }

    /// Snapshot for external readers
    pub(super) fn stats(&self) -> ProducerStats {
        ProducerStats {
            attempt: self.attempt,
            record_index: self.record_index,
            live: self.live,
            history_len: self.history.len(),
            bytes_received: self.bytes_received,
            uptime: self.connected_at.elapsed(),
        }
    }
}

/// Point-in-time statistics for a producer
#[derive(Debug, Clone)]
pub struct ProducerStats {
    /// Current connection-attempt sequence
    pub attempt: u64,
    /// Records accepted in the current attempt
    pub record_index: u64,
    /// Whether the producer's connection is live
    pub live: bool,
    /// Records currently held in the history buffer
    pub history_len: usize,
    /// Payload bytes accepted in the current attempt
    pub bytes_received: u64,
    /// Time since the current attempt was accepted
    pub uptime: std::time::Duration,
}
