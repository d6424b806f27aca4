//! Transport error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("dial failed: {0}")]
    Dial(String),

    #[error("bind failed: {0}")]
    Bind(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("connection closed")]
    Closed,

    #[error("write failed: {0}")]
    Write(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}

#[cfg(feature = "websocket")]
impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
            WsError::Io(io) => TransportError::Socket(io),
            other => TransportError::Read(other.to_string()),
        }
    }
}
