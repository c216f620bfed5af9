//! Fire-and-forget event publisher
//!
//! Serializes pipeline events and hands them to the push transport. A
//! publish failure is logged and swallowed: the record has already been
//! sequenced and persisted, and a broken viewer channel must never abort
//! a producer's read loop.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::registry::{ProducerId, RecordMeta};

use super::event::{ClearEvent, NewDataEvent, NewProducerEvent, Topic};
use super::transport::PushTransport;

/// Publishes pipeline events to the push transport
pub struct EventPublisher<T: PushTransport> {
    transport: Arc<T>,
}

impl<T: PushTransport> EventPublisher<T> {
    /// Create a publisher over a shared transport
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Announce a producer on the global channel.
    ///
    /// Fired once per connection attempt, before any record arrives, so
    /// viewers can enumerate producers that have not sent data yet.
    pub fn producer_known(&self, id: &ProducerId) {
        self.emit(Topic::NewProducer, &NewProducerEvent { ip: *id });
    }

    /// Tell viewers of a producer to reset their accumulated state.
    ///
    /// Fired once per connection attempt, when it is (re-)established.
    pub fn clear(&self, id: &ProducerId) {
        self.emit(Topic::Clear(*id), &ClearEvent {});
    }

    /// Push one forwarded record to the producer's live channel
    pub fn new_record(&self, id: &ProducerId, payload: &str, meta: &RecordMeta) {
        self.emit(
            Topic::NewData(*id),
            &NewDataEvent {
                data: payload,
                sequence: meta.attempt,
                index: meta.index,
            },
        );
    }

    fn emit<E: Serialize>(&self, topic: Topic, event: &E) {
        let payload = match serde_json::to_vec(event) {
            Ok(json) => Bytes::from(json),
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Failed to encode push event");
                return;
            }
        };

        if let Err(e) = self.transport.publish(&topic, payload) {
            tracing::error!(topic = %topic, error = %e, "Push publish failed");
        }
    }
}

impl<T: PushTransport> Clone for EventPublisher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}
