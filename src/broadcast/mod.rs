//! Event broadcast to viewers
//!
//! The pipeline publishes two kinds of events: a producer announcement
//! when a connection attempt is established, and a record push for every
//! validated record the throttle lets through. Topics are addressed by
//! producer identity; the transport behind them is a pluggable seam.

pub mod event;
pub mod publisher;
pub mod transport;

pub use event::{ClearEvent, NewDataEvent, NewProducerEvent, SubscribeRequest, Topic};
pub use publisher::EventPublisher;
pub use transport::{ChannelTransport, PublishError, PushTransport};
