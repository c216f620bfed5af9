//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent producer connections (0 = unlimited)
    pub max_connections: usize,

    /// Read deadline: a connection with no complete frame for this long
    /// is abandoned
    pub read_timeout: Duration,

    /// Largest accepted frame; a connection whose unterminated buffer
    /// outgrows this is dropped
    pub max_frame_size: usize,

    /// Application-level read buffer size
    pub read_buffer_size: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Directory session log files are written under
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".parse().unwrap(),
            max_connections: 0, // Unlimited
            read_timeout: Duration::from_secs(1800),
            max_frame_size: 1024 * 1024, // 1MB
            read_buffer_size: 64 * 1024, // 64KB
            tcp_nodelay: true,
            log_dir: PathBuf::from("log"),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the read deadline
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the frame size limit
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the session log directory
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8001);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.read_timeout, Duration::from_secs(1800));
        assert_eq!(config.max_frame_size, 1024 * 1024);
        assert!(config.tcp_nodelay);
        assert_eq!(config.log_dir, PathBuf::from("log"));
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8002".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 8002);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8001".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .read_timeout(Duration::from_secs(5))
            .max_frame_size(4096)
            .log_dir("/tmp/telemetry-log");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.max_frame_size, 4096);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/telemetry-log"));
    }
}
