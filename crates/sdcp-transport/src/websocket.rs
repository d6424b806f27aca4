//! WebSocket transport
//!
//! SDCP printers speak JSON over text frames. Each connection is split into
//! a writer task fed by a channel, which serialises concurrent senders, and a
//! reader task that turns frames into [`TransportEvent`]s.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::{Message, WebSocketConfig as ProtocolConfig};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{Connector, FrameListener, FrameReceiver, FrameSender, TransportEvent};

/// Frame limits and queue sizes
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Largest accepted message; attribute pushes are a few KB
    pub max_message_size: usize,
    /// Depth of the outgoing and incoming queues
    pub channel_capacity: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 1 << 20,
            channel_capacity: 64,
        }
    }
}

impl WebSocketConfig {
    fn protocol(&self) -> ProtocolConfig {
        let mut protocol = ProtocolConfig::default();
        protocol.max_message_size = Some(self.max_message_size);
        protocol.max_frame_size = Some(self.max_message_size);
        protocol
    }
}

/// Client side dialer
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Dial `url` (`ws://` or `wss://`) with explicit limits
    pub async fn connect_with_config(
        url: &str,
        config: &WebSocketConfig,
    ) -> Result<(WebSocketSender, WebSocketReceiver)> {
        let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            scheme => {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    scheme
                )))
            }
        }

        debug!("Dialing {}", url);

        let (stream, response) =
            tokio_tungstenite::connect_async_with_config(url, Some(config.protocol()), false)
                .await
                .map_err(|e| TransportError::Dial(e.to_string()))?;

        debug!("Upgraded {} ({})", url, response.status());

        Ok(split(stream, config))
    }
}

#[async_trait]
impl Connector for WebSocketTransport {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    async fn connect(url: &str) -> Result<(Self::Sender, Self::Receiver)> {
        Self::connect_with_config(url, &WebSocketConfig::default()).await
    }
}

/// Writing half; cheap to share behind an `Arc`
pub struct WebSocketSender {
    outgoing: mpsc::Sender<Message>,
    open: Arc<AtomicBool>,
}

#[async_trait]
impl FrameSender for WebSocketSender {
    async fn send(&self, frame: Bytes) -> Result<()> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }

        // SDCP frames are JSON, always sent as text
        let text = String::from_utf8(frame.to_vec())
            .map_err(|e| TransportError::Write(format!("frame is not UTF-8: {}", e)))?;

        self.outgoing
            .send(Message::Text(text))
            .await
            .map_err(|_| TransportError::Closed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.outgoing.send(Message::Close(None)).await;
        }
        Ok(())
    }
}

/// Reading half
pub struct WebSocketReceiver {
    incoming: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl FrameReceiver for WebSocketReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.incoming.recv().await
    }
}

/// Spawn the writer and reader tasks for one stream.
///
/// The reader stops as soon as the [`WebSocketReceiver`] is dropped, the writer
/// after forwarding a close frame or when every sender is gone.
fn split<S>(stream: WebSocketStream<S>, config: &WebSocketConfig) -> (WebSocketSender, WebSocketReceiver)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut source) = stream.split();
    let (outgoing, mut queue) = mpsc::channel::<Message>(config.channel_capacity);
    let (events, incoming) = mpsc::channel::<TransportEvent>(config.channel_capacity);
    let open = Arc::new(AtomicBool::new(true));

    let writer_open = open.clone();
    tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            let last = message.is_close();
            if let Err(e) = sink.send(message).await {
                warn!("WebSocket write failed: {}", e);
                break;
            }
            if last {
                break;
            }
        }
        writer_open.store(false, Ordering::SeqCst);
    });

    let reader_open = open.clone();
    tokio::spawn(async move {
        let _ = events.send(TransportEvent::Opened).await;

        let reason = loop {
            let next = tokio::select! {
                _ = events.closed() => break None,
                next = source.next() => next,
            };

            let frame = match next {
                Some(Ok(Message::Text(text))) => Bytes::from(text),
                Some(Ok(Message::Binary(data))) => Bytes::from(data),
                Some(Ok(Message::Close(frame))) => break frame.map(|f| f.reason.into_owned()),
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    let e = TransportError::from(e);
                    let _ = events.send(TransportEvent::Error(e.to_string())).await;
                    break Some(e.to_string());
                }
                None => break None,
            };

            if events.send(TransportEvent::Frame(frame)).await.is_err() {
                break None;
            }
        };

        reader_open.store(false, Ordering::SeqCst);
        info!("WebSocket closed: {:?}", reason);
        let _ = events.send(TransportEvent::Closed { reason }).await;
    });

    (
        WebSocketSender { outgoing, open },
        WebSocketReceiver { incoming },
    )
}

/// Listening side, used by printer simulators
pub struct WebSocketServer {
    listener: TcpListener,
    config: WebSocketConfig,
}

impl WebSocketServer {
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::Bind(e.to_string()))?;

        debug!("WebSocket listener on {}", addr);

        Ok(Self {
            listener,
            config: WebSocketConfig::default(),
        })
    }

    pub fn with_config(mut self, config: WebSocketConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl FrameListener for WebSocketServer {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)> {
        let (tcp, peer) = self.listener.accept().await?;

        let stream = tokio_tungstenite::accept_async_with_config(tcp, Some(self.config.protocol()))
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        debug!("WebSocket peer {} connected", peer);

        let (sender, receiver) = split(stream, &self.config);
        Ok((sender, receiver, peer))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_websocket_scheme() {
        let result = WebSocketTransport::connect("http://127.0.0.1:3030/websocket").await;
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_protocol_limits() {
        let config = WebSocketConfig {
            max_message_size: 4096,
            ..Default::default()
        };
        assert_eq!(config.protocol().max_message_size, Some(4096));
    }
}
