//! UDP datagram socket
//!
//! Discovery is a single probe followed by a bounded wait for replies, so the
//! socket is read directly by its owner instead of through a reader task.

use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::error::{Result, TransportError};

/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM: usize = 65507;

/// A bound UDP socket
pub struct UdpTransport {
    socket: UdpSocket,
    max_datagram: usize,
}

impl UdpTransport {
    /// Bind to a local address such as `0.0.0.0:0`
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::Bind(format!("{}: {}", addr, e)))?;

        Ok(Self {
            socket,
            max_datagram: MAX_DATAGRAM,
        })
    }

    /// Cap the size of datagrams returned by [`UdpTransport::recv_from`]
    pub fn with_max_datagram(mut self, max_datagram: usize) -> Self {
        self.max_datagram = max_datagram.clamp(1, MAX_DATAGRAM);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Allow sending to broadcast addresses
    pub fn set_broadcast(&self, enable: bool) -> Result<()> {
        Ok(self.socket.set_broadcast(enable)?)
    }

    pub async fn send_to(&self, datagram: &[u8], target: SocketAddr) -> Result<()> {
        let sent = self
            .socket
            .send_to(datagram, target)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))?;
        trace!("UDP sent {} bytes to {}", sent, target);
        Ok(())
    }

    /// Wait for the next datagram
    pub async fn recv_from(&self) -> Result<(Bytes, SocketAddr)> {
        let mut buf = vec![0u8; self.max_datagram];
        let (len, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| TransportError::Read(e.to_string()))?;
        buf.truncate(len);
        trace!("UDP received {} bytes from {}", len, from);
        Ok((Bytes::from(buf), from))
    }

    /// Wait up to `wait` for one datagram.
    ///
    /// `Ok(None)` means the wait elapsed with nothing to read.
    pub async fn recv_timeout(
        &self,
        buf: &mut [u8],
        wait: Duration,
    ) -> Result<Option<(usize, SocketAddr)>> {
        match tokio::time::timeout(wait, self.socket.recv_from(buf)).await {
            Err(_) => Ok(None),
            Ok(Ok((len, from))) => {
                trace!("UDP received {} bytes from {}", len, from);
                Ok(Some((len, from)))
            }
            Ok(Err(e)) => Err(TransportError::Read(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ephemeral_bind() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        assert_ne!(transport.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_recv_timeout_elapses_quietly() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let mut buf = [0u8; 64];
        let got = transport
            .recv_timeout(&mut buf, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_oversized_datagram_is_truncated() {
        let receiver = UdpTransport::bind("127.0.0.1:0")
            .await
            .unwrap()
            .with_max_datagram(4);
        let sender = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        sender
            .send_to(b"M99999", receiver.local_addr().unwrap())
            .await
            .unwrap();
        let (datagram, _) = receiver.recv_from().await.unwrap();
        assert_eq!(datagram.as_ref(), b"M999");
    }
}
