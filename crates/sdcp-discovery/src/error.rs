//! Discovery error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("unable to create udp socket: {0}")]
    SocketCreate(String),

    #[error("broadcast failed: {0}")]
    Broadcast(String),

    #[error("reading udp socket failed: {0}")]
    Receive(String),

    #[error("invalid discovery reply from {from}: {reason}")]
    Decode { from: String, reason: String },
}

impl DiscoveryError {
    /// Receive and decode failures both happen after the probe went out
    pub fn is_receive_failure(&self) -> bool {
        matches!(self, DiscoveryError::Receive(_) | DiscoveryError::Decode { .. })
    }
}
