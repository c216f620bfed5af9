//! Push-channel transport seam
//!
//! The transport that carries events to viewers is external to this
//! crate; the pipeline only needs a non-blocking, per-topic publish. The
//! in-process [`ChannelTransport`] backs that seam with bounded
//! `tokio::sync::broadcast` channels: a slow or absent viewer loses
//! messages, never stalls a producer's read loop.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tokio::sync::broadcast;

use super::event::Topic;

/// Error type for transport publish attempts
#[derive(Debug, Clone)]
pub enum PublishError {
    /// The transport has shut down and will accept no more events
    Disconnected,
    /// The transport refused this event
    Rejected(String),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Disconnected => write!(f, "push transport disconnected"),
            PublishError::Rejected(reason) => write!(f, "push transport rejected event: {}", reason),
        }
    }
}

impl std::error::Error for PublishError {}

/// A per-topic push channel the pipeline can publish into.
///
/// Implementations must not block: `publish` is called from connection
/// read loops and has enqueue semantics. Delivery is best-effort; the
/// pipeline treats every publish as fire-and-forget.
pub trait PushTransport: Send + Sync + 'static {
    /// Enqueue an event payload on a topic
    fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), PublishError>;
}

/// In-process transport over bounded broadcast channels
///
/// Channels are created lazily when the first viewer subscribes.
/// Publishing to a topic nobody listens on discards the event, matching
/// push semantics: history for late joiners comes from the registry, not
/// the transport.
pub struct ChannelTransport {
    topics: RwLock<HashMap<Topic, broadcast::Sender<Bytes>>>,
    capacity: usize,
}

impl ChannelTransport {
    /// Create a transport with the default per-topic queue capacity
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a transport with a custom per-topic queue capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe to a topic, creating its channel if needed.
    ///
    /// Each receiver sees every event published after this call, minus
    /// any it lags too far behind on.
    pub fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<Bytes> {
        let mut topics = self.topics.write().expect("transport lock poisoned");

        topics
            .entry(*topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of topics with at least one subscription so far
    pub fn topic_count(&self) -> usize {
        self.topics.read().expect("transport lock poisoned").len()
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PushTransport for ChannelTransport {
    fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), PublishError> {
        let topics = self.topics.read().expect("transport lock poisoned");

        if let Some(tx) = topics.get(topic) {
            // send() errs only when no receiver is alive; for a push
            // channel that just means nobody is watching.
            let _ = tx.send(payload);
        }

        Ok(())
    }
}
