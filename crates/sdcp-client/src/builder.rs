//! Session configuration and builder pattern

use sdcp_transport::WebSocketConfig;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{Result, Session};

/// Per-session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Printer WebSocket port
    pub port: u16,
    /// WebSocket path on the printer
    pub path: String,
    /// Interval of the background status/attributes refresh
    pub refresh_interval: Duration,
    /// Upper bound for each of the two handshake refreshes
    pub handshake_timeout: Duration,
    /// Frame limits and queue sizes
    pub websocket: WebSocketConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: sdcp_core::DEFAULT_WS_PORT,
            path: sdcp_core::WS_PATH.to_string(),
            refresh_interval: Duration::from_secs(15),
            handshake_timeout: Duration::from_secs(10),
            websocket: WebSocketConfig::default(),
        }
    }
}

impl SessionConfig {
    /// WebSocket URL for a printer at `address`.
    ///
    /// An address that already names a port (`10.0.0.5:3030`) keeps it.
    pub fn endpoint(&self, address: &str) -> String {
        if let Ok(addr) = address.parse::<SocketAddr>() {
            return format!("ws://{}{}", addr, self.path);
        }
        match address.parse::<IpAddr>() {
            Ok(ip) => format!("ws://{}{}", SocketAddr::new(ip, self.port), self.path),
            Err(_) => format!("ws://{}:{}{}", address, self.port, self.path),
        }
    }
}

/// Builder for a single [`Session`]
pub struct SessionBuilder {
    id: String,
    address: String,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a new builder
    pub fn new(id: &str, address: &str) -> Self {
        Self {
            id: id.to_string(),
            address: address.to_string(),
            config: SessionConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the printer port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the WebSocket path
    pub fn path(mut self, path: &str) -> Self {
        self.config.path = path.to_string();
        self
    }

    /// Set the background refresh interval
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval = interval;
        self
    }

    /// Set the handshake bound
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Dial and handshake
    pub async fn connect(self) -> Result<Session> {
        self.connect_with_cancel(&CancellationToken::new()).await
    }

    /// Dial and handshake, giving up when `cancel` fires
    pub async fn connect_with_cancel(self, cancel: &CancellationToken) -> Result<Session> {
        Session::open(&self.id, &self.address, self.config, cancel).await
    }
}
