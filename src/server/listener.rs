//! Telemetry server listener
//!
//! Handles the TCP accept loop and spawns one connection pipeline per
//! producer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::broadcast::{EventPublisher, PushTransport};
use crate::error::Result;
use crate::registry::{ProducerId, ProducerRegistry, RegistryConfig};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::throttle::{SubscriptionThrottle, ThrottleConfig};

/// Telemetry ingest server
pub struct TelemetryServer<T: PushTransport> {
    config: ServerConfig,
    registry: Arc<ProducerRegistry>,
    throttle: Arc<SubscriptionThrottle>,
    transport: Arc<T>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl<T: PushTransport> TelemetryServer<T> {
    /// Create a new server with the given configuration and push transport
    pub fn new(config: ServerConfig, transport: T) -> Self {
        Self::with_configs(
            config,
            transport,
            RegistryConfig::default(),
            ThrottleConfig::default(),
        )
    }

    /// Create a new server with custom registry and throttle configuration
    pub fn with_configs(
        config: ServerConfig,
        transport: T,
        registry_config: RegistryConfig,
        throttle_config: ThrottleConfig,
    ) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            registry: Arc::new(ProducerRegistry::with_config(registry_config)),
            throttle: Arc::new(SubscriptionThrottle::with_config(throttle_config)),
            transport: Arc::new(transport),
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the producer registry
    pub fn registry(&self) -> &Arc<ProducerRegistry> {
        &self.registry
    }

    /// Get a reference to the subscription throttle
    pub fn throttle(&self) -> &Arc<SubscriptionThrottle> {
        &self.throttle
    }

    /// Get a reference to the push transport
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Handle a viewer's subscribe request.
    ///
    /// Grants credit only for identities the registry has seen; returns
    /// whether the grant was made.
    pub async fn subscribe(&self, id: &ProducerId) -> bool {
        if self.registry.stats(id).await.is_none() {
            tracing::debug!(producer = %id, "Subscribe request for unknown producer");
            return false;
        }

        self.throttle.subscribe(id);
        true
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down. Failure to bind
    /// the listen address is fatal and returned immediately.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Telemetry server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Telemetry server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit; the permit rides along with the task so
        // the slot frees only when the connection ends.
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);
        let throttle = Arc::clone(&self.throttle);
        let publisher = EventPublisher::new(Arc::clone(&self.transport));

        tokio::spawn(async move {
            let _permit = permit;

            let connection = Connection::new(
                session_id,
                socket,
                peer_addr,
                config,
                registry,
                throttle,
                publisher,
            );

            // Failures are already logged with connection context
            let _ = connection.run().await;
        });
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{ChannelTransport, Topic};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    async fn start_server() -> (Arc<TelemetryServer<ChannelTransport>>, SocketAddr, tempfile::TempDir) {
        let log_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::default()
            .bind("127.0.0.1:0".parse().unwrap())
            .log_dir(log_dir.path());

        // Bind on an ephemeral port first so tests know where to connect
        let listener = TcpListener::bind(config.bind_addr).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Arc::new(TelemetryServer::new(config, ChannelTransport::new()));
        {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let _ = server.accept_loop(&listener).await;
            });
        }

        (server, addr, log_dir)
    }

    async fn wait_for<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_ingest_over_real_socket() {
        let (server, addr, _log_dir) = start_server().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"{\"v\":1}\n{\"v\":2}\n").await.unwrap();
        client.shutdown().await.unwrap();

        let identity = ProducerId::new("127.0.0.1".parse().unwrap());
        let registry = Arc::clone(server.registry());
        wait_for(|| {
            let registry = Arc::clone(&registry);
            async move {
                registry
                    .stats(&identity)
                    .await
                    .map(|s| s.record_index == 2 && !s.live)
                    .unwrap_or(false)
            }
        })
        .await;

        let history = server.registry().history(&identity).await;
        assert_eq!(history.len(), 2);
        assert_eq!(&*history[0], "{\"v\":1}");
    }

    #[tokio::test]
    async fn test_subscribed_viewer_receives_pushes() {
        let (server, addr, _log_dir) = start_server().await;
        let identity = ProducerId::new("127.0.0.1".parse().unwrap());

        let mut data_rx = server.transport().subscribe(&Topic::NewData(identity));

        // First connection makes the producer known, then the viewer
        // subscribes and a second connection streams records.
        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"{\"v\":0}\n").await.unwrap();
        first.shutdown().await.unwrap();

        // Wait for the first attempt to finish so its record is decided
        // before the grant exists
        let registry = Arc::clone(server.registry());
        wait_for(|| {
            let registry = Arc::clone(&registry);
            async move {
                registry
                    .stats(&identity)
                    .await
                    .map(|s| s.record_index == 1 && !s.live)
                    .unwrap_or(false)
            }
        })
        .await;

        assert!(server.subscribe(&identity).await);

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"{\"v\":1}\n{\"v\":2}\n").await.unwrap();
        second.shutdown().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), data_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&event).unwrap();
        assert_eq!(value["data"], "{\"v\":1}");
        assert_eq!(value["sequence"], 1); // second attempt
        assert_eq!(value["index"], 1);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_identity_rejected() {
        let (server, _addr, _log_dir) = start_server().await;
        let ghost = ProducerId::new("203.0.113.9".parse().unwrap());

        assert!(!server.subscribe(&ghost).await);
        assert_eq!(server.throttle().remaining(&ghost), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        // Occupy a port, then ask a second server for the same one
        let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = holder.local_addr().unwrap();

        let config = ServerConfig::default().bind(addr);
        let server = TelemetryServer::new(config, ChannelTransport::new());

        assert!(server.run().await.is_err());
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_excess() {
        let log_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::default()
            .bind("127.0.0.1:0".parse().unwrap())
            .max_connections(1)
            .log_dir(log_dir.path());

        let listener = TcpListener::bind(config.bind_addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(TelemetryServer::new(config, ChannelTransport::new()));
        {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let _ = server.accept_loop(&listener).await;
            });
        }

        // First connection holds the only slot
        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"{\"v\":1}\n").await.unwrap();

        let registry = Arc::clone(server.registry());
        let identity = ProducerId::new("127.0.0.1".parse().unwrap());
        wait_for(|| {
            let registry = Arc::clone(&registry);
            async move { registry.stats(&identity).await.is_some() }
        })
        .await;

        // The second is accepted at the TCP level but dropped before the
        // pipeline; its records never register. The write may fail with a
        // reset once the server side is gone.
        let mut second = TcpStream::connect(addr).await.unwrap();
        let _ = second.write_all(b"{\"v\":2}\n").await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        let stats = registry.stats(&identity).await.unwrap();
        assert_eq!(stats.attempt, 0);
        assert_eq!(stats.record_index, 1);
    }
}
