//! Topics and event payloads
//!
//! Topic addressing is derived from the producer identity: one global
//! topic announces producers, and each producer gets its own `clear` and
//! `new_data` topics. Payloads are JSON, shaped to match what the viewer
//! side already speaks.

use serde::{Deserialize, Serialize};

use crate::registry::ProducerId;

/// Address of a push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Global announcement channel for newly connected producers
    NewProducer,
    /// Per-producer signal to reset accumulated viewer state
    Clear(ProducerId),
    /// Per-producer live record channel
    NewData(ProducerId),
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::NewProducer => write!(f, "new_ip"),
            Topic::Clear(id) => write!(f, "clear/{}", id),
            Topic::NewData(id) => write!(f, "new_data/{}", id),
        }
    }
}

/// Payload of a producer announcement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProducerEvent {
    /// Identity of the announced producer
    pub ip: ProducerId,
}

/// Payload of a clear signal (deliberately empty; the topic names the
/// producer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearEvent {}

/// Payload of a live record push
#[derive(Debug, Clone, Serialize)]
pub struct NewDataEvent<'a> {
    /// Raw record text, exactly as received (minus the frame terminator)
    pub data: &'a str,
    /// Connection-attempt sequence of the producing connection
    pub sequence: u64,
    /// Record index within that attempt
    pub index: u64,
}

/// A viewer's request to (re)subscribe to a producer's stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Identity the viewer wants records from
    pub ip: ProducerId,
}
