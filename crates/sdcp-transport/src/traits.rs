//! Frame-level transport seams
//!
//! A connection is split in two halves: a [`FrameSender`] that may be shared
//! by any number of tasks, and a [`FrameReceiver`] owned by exactly one reader.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;

use crate::error::Result;

/// What the reader half observes
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Handshake finished, frames may follow
    Opened,
    /// One complete text or binary frame
    Frame(Bytes),
    /// Read failure; a `Closed` follows
    Error(String),
    /// The peer closed or the stream ended
    Closed { reason: Option<String> },
}

/// Writing half of a connection
#[async_trait]
pub trait FrameSender: Send + Sync {
    /// Queue one frame for the writer
    async fn send(&self, frame: Bytes) -> Result<()>;

    /// False once either side has closed
    fn is_open(&self) -> bool;

    /// Send a close frame and refuse further sends
    async fn close(&self) -> Result<()>;
}

/// Reading half of a connection
#[async_trait]
pub trait FrameReceiver: Send {
    /// Next event, `None` once the reader task is gone
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Dials a remote endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    type Sender: FrameSender;
    type Receiver: FrameReceiver;

    async fn connect(url: &str) -> Result<(Self::Sender, Self::Receiver)>
    where
        Self: Sized;
}

/// Accepts inbound connections
#[async_trait]
pub trait FrameListener: Send + Sync {
    type Sender: FrameSender;
    type Receiver: FrameReceiver;

    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)>;

    fn local_addr(&self) -> Result<SocketAddr>;
}
