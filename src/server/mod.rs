//! Telemetry ingest server
//!
//! The acceptor, per-connection pipeline, and their configuration.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::TelemetryServer;
