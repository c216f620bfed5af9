//! Per-connection frame-reader pipeline
//!
//! One connection task per producer: read raw bytes under a deadline,
//! reassemble newline-terminated frames, validate them as JSON, then run
//! each validated record through the registry, the session log, the
//! throttle, and (for forwarded records) the broadcast publisher.
//!
//! Everything here is isolated to the one producer: a malformed frame is
//! discarded and reading resumes; a timeout or socket error ends only
//! this connection; a transport failure is logged by the publisher and
//! never reaches the loop.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use chrono::Local;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::broadcast::{EventPublisher, PushTransport};
use crate::error::{Error, Result};
use crate::protocol::{validate_frame, FrameAccumulator};
use crate::registry::{ProducerId, ProducerRegistry};
use crate::server::config::ServerConfig;
use crate::session::SessionLogWriter;
use crate::throttle::{ForwardDecision, SubscriptionThrottle};

/// State for one producer connection
pub struct Connection<S, T: PushTransport> {
    session_id: u64,
    stream: S,
    peer_addr: SocketAddr,
    config: ServerConfig,
    registry: Arc<ProducerRegistry>,
    throttle: Arc<SubscriptionThrottle>,
    publisher: EventPublisher<T>,
}

impl<S, T> Connection<S, T>
where
    S: AsyncRead + Unpin,
    T: PushTransport,
{
    /// Create a connection pipeline for an accepted stream
    pub fn new(
        session_id: u64,
        stream: S,
        peer_addr: SocketAddr,
        config: ServerConfig,
        registry: Arc<ProducerRegistry>,
        throttle: Arc<SubscriptionThrottle>,
        publisher: EventPublisher<T>,
    ) -> Self {
        Self {
            session_id,
            stream,
            peer_addr,
            config,
            registry,
            throttle,
            publisher,
        }
    }

    /// Run the pipeline until EOF, timeout, or error.
    ///
    /// Registers the connection attempt, announces the producer, then
    /// reads frames until the peer goes away. Liveness is cleared on
    /// every exit path.
    pub async fn run(mut self) -> Result<()> {
        let identity = ProducerId::from_peer(self.peer_addr);

        let attempt = self.registry.on_connect(&identity).await;
        tracing::debug!(
            session_id = self.session_id,
            producer = %identity,
            attempt = attempt,
            "Producer connection accepted"
        );

        // Viewers learn about the producer (and reset any stale display
        // state) before the first record arrives.
        self.publisher.producer_known(&identity);
        self.publisher.clear(&identity);

        let result = self.read_loop(&identity).await;

        self.registry.on_disconnect(&identity).await;

        match &result {
            Ok(()) => {
                tracing::debug!(
                    session_id = self.session_id,
                    producer = %identity,
                    "Producer disconnected"
                );
            }
            Err(Error::ReadTimeout) => {
                tracing::warn!(
                    session_id = self.session_id,
                    producer = %identity,
                    timeout_secs = self.config.read_timeout.as_secs(),
                    "Connection timed out"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = self.session_id,
                    producer = %identity,
                    error = %e,
                    "Connection failed"
                );
            }
        }

        result
    }

    async fn read_loop(&mut self, identity: &ProducerId) -> Result<()> {
        let mut journal =
            SessionLogWriter::new(&self.config.log_dir, identity, Local::now());
        let mut frames = FrameAccumulator::new(self.config.max_frame_size);
        let mut chunk = BytesMut::with_capacity(self.config.read_buffer_size);

        loop {
            let read = tokio::time::timeout(
                self.config.read_timeout,
                self.stream.read_buf(&mut chunk),
            )
            .await;

            let n = match read {
                Err(_elapsed) => return Err(Error::ReadTimeout),
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(0)) => break, // EOF: peer closed cleanly
                Ok(Ok(n)) => n,
            };

            tracing::trace!(
                session_id = self.session_id,
                bytes = n,
                "Received chunk"
            );

            frames.push(&chunk);
            chunk.clear();

            while let Some(frame) = frames.next_frame() {
                self.process_frame(identity, &frame, &mut journal).await?;
            }

            if frames.over_limit() {
                journal.flush().await?;
                return Err(Error::FrameTooLarge {
                    size: frames.pending(),
                    limit: frames.max_frame_size(),
                });
            }
        }

        journal.flush().await?;
        Ok(())
    }

    async fn process_frame(
        &mut self,
        identity: &ProducerId,
        frame: &[u8],
        journal: &mut SessionLogWriter,
    ) -> Result<()> {
        let text = match validate_frame(frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    session_id = self.session_id,
                    producer = %identity,
                    error = %e,
                    "Discarding invalid frame"
                );
                return Ok(());
            }
        };

        let payload: Arc<str> = Arc::from(text);

        let Some(meta) = self.registry.on_record(identity, Arc::clone(&payload)).await else {
            return Ok(());
        };

        // Persisted before the forward decision: the log is complete even
        // for records no viewer ever sees.
        journal.append(&payload).await?;

        tracing::debug!(
            session_id = self.session_id,
            producer = %identity,
            index = meta.index,
            "Record accepted"
        );

        match self.throttle.on_record(identity) {
            ForwardDecision::Forward => {
                self.publisher.new_record(identity, &payload, &meta);
            }
            ForwardDecision::Drop => {
                tracing::debug!(
                    session_id = self.session_id,
                    producer = %identity,
                    "No active subscription, record not pushed"
                );
            }
        }

        Ok(())
    }
}
