//! Client error types

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("dial {url} failed: {reason}")]
    Dial { url: String, reason: String },

    #[error("status handshake failed: {0}")]
    StatusHandshake(Box<ClientError>),

    #[error("attributes handshake failed: {0}")]
    AttributesHandshake(Box<ClientError>),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("session closed")]
    SessionClosed,

    #[error("decode failed: {0}")]
    Decode(#[from] sdcp_core::Error),

    #[error("printer {0} is already registered")]
    AlreadyRegistered(String),

    #[error("printer {0} not found")]
    NotFound(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// True when the printer or the connection is at fault rather than the caller
    pub fn is_device_error(&self) -> bool {
        !matches!(
            self,
            ClientError::AlreadyRegistered(_) | ClientError::NotFound(_) | ClientError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_errors() {
        assert!(!ClientError::AlreadyRegistered("A1B2".into()).is_device_error());
        assert!(!ClientError::Cancelled.is_device_error());
        assert!(ClientError::SessionClosed.is_device_error());
        assert!(ClientError::StatusHandshake(Box::new(ClientError::SessionClosed)).is_device_error());
    }
}
