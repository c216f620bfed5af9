//! Producer identity
//!
//! A producer is identified by the source address of its connection, host
//! only: the ephemeral port is discarded so reconnects map back to the
//! same identity. The identity keys the registry, the throttle, the
//! broadcast topics, and the session-log file names.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Identity of a telemetry producer (source IP, port discarded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProducerId(IpAddr);

impl ProducerId {
    /// Create an identity from a raw IP address
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    /// Derive the identity from a peer address, discarding the port
    pub fn from_peer(addr: SocketAddr) -> Self {
        Self(addr.ip())
    }

    /// The underlying IP address
    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for ProducerId {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl std::fmt::Display for ProducerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_discarded() {
        let a = ProducerId::from_peer("10.0.0.7:50001".parse().unwrap());
        let b = ProducerId::from_peer("10.0.0.7:50002".parse().unwrap());

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "10.0.0.7");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProducerId::new("192.168.1.20".parse().unwrap());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"192.168.1.20\"");

        let back: ProducerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
