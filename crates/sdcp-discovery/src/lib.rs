//! SDCP Discovery
//!
//! Finds printers on the local network by broadcasting the `M99999` probe
//! and collecting the JSON replies that arrive within a bounded window.
//! Discovery is stateless: every call opens its own socket, and whatever is
//! found is handed back to the caller to register or ignore.

pub mod broadcast;
pub mod error;

pub use broadcast::{discover, BroadcastResponder};
pub use error::{DiscoveryError, Result};

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Discovery configuration
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Address the probe is sent to
    pub broadcast_addr: Ipv4Addr,
    /// Broadcast port
    pub port: u16,
    /// Total listening window after the probe
    pub timeout: Duration,
    /// Length of each read attempt inside the window
    pub poll_interval: Duration,
    /// Largest reply accepted
    pub max_datagram: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            broadcast_addr: sdcp_core::BROADCAST_ADDR,
            port: sdcp_core::DEFAULT_DISCOVERY_PORT,
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            max_datagram: 8192,
        }
    }
}

impl DiscoveryConfig {
    pub fn target(&self) -> SocketAddr {
        SocketAddr::from((self.broadcast_addr, self.port))
    }
}

/// Discovery engine
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    config: DiscoveryConfig,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run one discovery window
    pub async fn discover(&self) -> Result<Vec<sdcp_core::DiscoveryMessage>> {
        broadcast::discover(&self.config).await
    }
}
