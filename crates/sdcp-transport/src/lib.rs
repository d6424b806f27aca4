//! SDCP Transport Layer
//!
//! The two transports an SDCP host needs:
//! - WebSocket, one persistent connection per printer carrying JSON text frames
//! - UDP, for the discovery probe and its replies

pub mod error;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

#[cfg(feature = "udp")]
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::{Connector, FrameListener, FrameReceiver, FrameSender, TransportEvent};

#[cfg(feature = "websocket")]
pub use websocket::{
    WebSocketConfig, WebSocketReceiver, WebSocketSender, WebSocketServer, WebSocketTransport,
};

#[cfg(feature = "udp")]
pub use udp::{UdpTransport, MAX_DATAGRAM};
