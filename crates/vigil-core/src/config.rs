//! Protocol Configuration
//!
//! Centralized settings shared by the coordinator and agent binaries, with
//! environment variable overrides.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// Protocol configuration with the stock defaults.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Multicast group the coordinator announces on (env: VIGIL_MULTICAST_GROUP)
    pub multicast_group: Ipv4Addr,

    /// UDP port shared by both roles (env: VIGIL_PORT)
    pub port: u16,

    /// Liveness timeout (env: VIGIL_TIMEOUT_SECS). One knob governs the
    /// cycle period, the dead-agent threshold, and (halved) the reply
    /// collect window.
    pub timeout: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            multicast_group: Ipv4Addr::new(239, 255, 1, 1),
            port: 12345,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ProtocolConfig {
    /// Create configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(group) = std::env::var("VIGIL_MULTICAST_GROUP") {
            if let Ok(parsed) = group.parse::<Ipv4Addr>() {
                config.multicast_group = parsed;
            }
        }

        if let Ok(port) = std::env::var("VIGIL_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                config.port = parsed;
            }
        }

        if let Ok(secs) = std::env::var("VIGIL_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                config.timeout = Duration::from_secs(parsed);
            }
        }

        config
    }

    /// Destination address for discovery probes.
    pub fn group_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.multicast_group, self.port))
    }

    /// How long the coordinator waits for replies after a probe. Half the
    /// liveness timeout, so the collect window always closes before an
    /// answering agent could cross the dead threshold.
    pub fn collect_window(&self) -> Duration {
        self.timeout / 2
    }

    /// Interval between discovery cycles. Same knob as the dead-agent
    /// threshold: an agent is dead once it has stayed silent for a full
    /// cycle.
    pub fn period(&self) -> Duration {
        self.timeout
    }
}
