//! Bounded per-producer record history
//!
//! Each producer keeps the most recent records in memory so the page layer
//! can render a view without replaying the log file. The buffer is bounded;
//! once full, the oldest record is evicted for every new one (FIFO).

use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded FIFO buffer of raw record payloads
#[derive(Debug)]
pub struct HistoryBuffer {
    capacity: usize,
    records: VecDeque<Arc<str>>,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::new(),
        }
    }

    /// Append a record, evicting the oldest if the buffer is full
    pub fn push(&mut self, record: Arc<str>) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all buffered records
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Snapshot of the buffered records in arrival order.
    ///
    /// Clones are reference-counted, so a snapshot is cheap and readers
    /// never observe a partially applied mutation.
    pub fn snapshot(&self) -> Vec<Arc<str>> {
        self.records.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(n: usize) -> Arc<str> {
        Arc::from(format!("{{\"n\":{}}}", n).as_str())
    }

    #[test]
    fn test_push_and_snapshot_order() {
        let mut buffer = HistoryBuffer::with_capacity(10);

        buffer.push(rec(1));
        buffer.push(rec(2));
        buffer.push(rec(3));

        let snap = buffer.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(&*snap[0], "{\"n\":1}");
        assert_eq!(&*snap[2], "{\"n\":3}");
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut buffer = HistoryBuffer::with_capacity(1000);

        for n in 1..=1001 {
            buffer.push(rec(n));
            assert!(buffer.len() <= 1000);
        }

        // After 1001 inserts the buffer holds records 2..=1001, oldest first
        let snap = buffer.snapshot();
        assert_eq!(snap.len(), 1000);
        assert_eq!(&*snap[0], "{\"n\":2}");
        assert_eq!(&*snap[999], "{\"n\":1001}");
    }

    #[test]
    fn test_clear() {
        let mut buffer = HistoryBuffer::with_capacity(4);
        buffer.push(rec(1));
        buffer.push(rec(2));

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 4);
    }
}
