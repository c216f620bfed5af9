//! Line-delimited JSON telemetry ingest and live relay.
//!
//! Producers connect over plain TCP and send one JSON document per line.
//! The server validates each frame, appends it to a per-session log file,
//! keeps a bounded in-memory history per producer, and pushes records to
//! subscribed viewers through a pluggable per-topic transport, with a
//! decaying per-viewer budget so an idle viewer silently stops receiving.
//!
//! # Pipeline
//!
//! ```text
//! TCP producer ──► FrameAccumulator ──► JSON validation
//!                                            │
//!                       ┌────────────────────┤
//!                       ▼                    ▼
//!               SessionLogWriter      ProducerRegistry
//!                 (one file per        (attempt seq, record
//!                  attempt)             index, history)
//!                                            │
//!                                            ▼
//!                                  SubscriptionThrottle
//!                                      forward? ──► EventPublisher ──► viewers
//! ```
//!
//! # Example
//!
//! ```no_run
//! use telemetry_rs::broadcast::ChannelTransport;
//! use telemetry_rs::{ServerConfig, TelemetryServer};
//!
//! #[tokio::main]
//! async fn main() -> telemetry_rs::error::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = TelemetryServer::new(config, ChannelTransport::new());
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod throttle;

pub use error::{Error, Result};
pub use registry::{ProducerId, ProducerRegistry};
pub use server::{ServerConfig, TelemetryServer};
pub use throttle::SubscriptionThrottle;
