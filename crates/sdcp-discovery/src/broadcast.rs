//! UDP broadcast discovery

use sdcp_core::{DiscoveryMessage, DISCOVERY_PROBE};
use sdcp_transport::UdpTransport;
use std::net::SocketAddr;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{DiscoveryConfig, DiscoveryError, Result};

/// Broadcast the probe and collect replies until the window closes.
///
/// An empty result is not an error. Any receive or decode failure aborts the
/// window; callers may simply call again.
pub async fn discover(config: &DiscoveryConfig) -> Result<Vec<DiscoveryMessage>> {
    // Bind to any available port
    let transport = UdpTransport::bind("0.0.0.0:0")
        .await
        .map_err(|e| DiscoveryError::SocketCreate(e.to_string()))?;

    transport
        .set_broadcast(true)
        .map_err(|e| DiscoveryError::SocketCreate(e.to_string()))?;

    let target = config.target();
    debug!(
        listen = ?transport.local_addr().ok(),
        "Broadcasting discovery probe to {}",
        target
    );

    transport
        .send_to(DISCOVERY_PROBE, target)
        .await
        .map_err(|e| DiscoveryError::Broadcast(e.to_string()))?;

    let deadline = Instant::now() + config.timeout;
    let mut discovered = Vec::new();
    let mut buf = vec![0u8; config.max_datagram];

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let wait = config.poll_interval.min(deadline - now);

        let Some((len, from)) = transport
            .recv_timeout(&mut buf, wait)
            .await
            .map_err(|e| DiscoveryError::Receive(e.to_string()))?
        else {
            continue;
        };

        let message: DiscoveryMessage =
            serde_json::from_slice(&buf[..len]).map_err(|e| DiscoveryError::Decode {
                from: from.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            id = %message.id,
            mainboard = %message.data.mainboard_id,
            ip = %message.data.mainboard_ip,
            "Discovered printer {}",
            message.data.name
        );
        discovered.push(message);
    }

    debug!("Discovery window closed with {} replies", discovered.len());
    Ok(discovered)
}

/// Answers discovery probes the way a printer mainboard does
pub struct BroadcastResponder {
    transport: UdpTransport,
    reply: DiscoveryMessage,
}

impl BroadcastResponder {
    pub async fn bind(addr: &str, reply: DiscoveryMessage) -> Result<Self> {
        let transport = UdpTransport::bind(addr)
            .await
            .map_err(|e| DiscoveryError::SocketCreate(e.to_string()))?;

        info!("Discovery responder listening on {}", addr);

        Ok(Self { transport, reply })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport
            .local_addr()
            .map_err(|e| DiscoveryError::SocketCreate(e.to_string()))
    }

    /// Reply to every probe until the socket fails
    pub async fn run(&self) -> Result<()> {
        let reply = serde_json::to_vec(&self.reply)
            .map_err(|e| DiscoveryError::Broadcast(e.to_string()))?;

        loop {
            let (datagram, from) = self
                .transport
                .recv_from()
                .await
                .map_err(|e| DiscoveryError::Receive(e.to_string()))?;

            if &datagram[..] != DISCOVERY_PROBE {
                debug!("Ignoring non-probe datagram from {}", from);
                continue;
            }

            debug!("Received discovery probe from {}", from);
            if let Err(e) = self.transport.send_to(&reply, from).await {
                warn!("Failed to answer probe from {}: {}", from, e);
            }
        }
    }
}
