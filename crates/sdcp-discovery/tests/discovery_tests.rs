//! Discovery Tests (sdcp-discovery)
//!
//! Loopback tests for the broadcast discovery window:
//! - replies from a responder are collected and decoded
//! - an empty network yields an empty list within the window
//! - malformed replies abort the window with a receive/decode error

use sdcp_core::{DiscoveryData, DiscoveryMessage};
use sdcp_discovery::{BroadcastResponder, Discovery, DiscoveryConfig, DiscoveryError};
use sdcp_transport::UdpTransport;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

fn reply(id: &str) -> DiscoveryMessage {
    DiscoveryMessage {
        id: "979d4C788A4a78bC777A870F1A02867A".to_string(),
        data: DiscoveryData {
            name: "Saturn".to_string(),
            model: "Saturn 4 Ultra".to_string(),
            brand_name: "ELEGOO".to_string(),
            mainboard_ip: "127.0.0.1".to_string(),
            mainboard_id: id.to_string(),
            protocol_version: "V3.0.0".to_string(),
            firmware_version: "V1.0.0".to_string(),
        },
    }
}

fn loopback_config(port: u16) -> DiscoveryConfig {
    DiscoveryConfig {
        broadcast_addr: Ipv4Addr::LOCALHOST,
        port,
        timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    }
}

#[test]
fn test_default_config() {
    let config = DiscoveryConfig::default();
    assert_eq!(config.port, 3000);
    assert_eq!(config.broadcast_addr, Ipv4Addr::BROADCAST);
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.poll_interval, Duration::from_millis(100));
}

#[tokio::test]
async fn test_discovers_responder() {
    let responder = BroadcastResponder::bind("127.0.0.1:0", reply("A1B2"))
        .await
        .unwrap();
    let port = responder.local_addr().unwrap().port();
    let handle = tokio::spawn(async move { responder.run().await });

    let found = Discovery::with_config(loopback_config(port))
        .discover()
        .await
        .expect("discovery failed");

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].data.mainboard_id, "A1B2");
    assert_eq!(found[0].data.brand_name, "ELEGOO");

    handle.abort();
}

#[tokio::test]
async fn test_no_responders_is_empty_not_error() {
    let port = {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    };

    let start = Instant::now();
    let found = Discovery::with_config(loopback_config(port))
        .discover()
        .await
        .expect("empty discovery must not fail");

    let elapsed = start.elapsed();
    assert!(found.is_empty());
    assert!(elapsed >= Duration::from_millis(180), "returned early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "overran window: {:?}", elapsed);
}

#[tokio::test]
async fn test_malformed_reply_is_receive_failure() {
    let fake = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    let port = fake.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        if let Ok((_, from)) = fake.recv_from().await {
            let _ = fake.send_to(b"not json", from).await;
        }
    });

    let err = Discovery::with_config(loopback_config(port))
        .discover()
        .await
        .unwrap_err();

    assert!(matches!(err, DiscoveryError::Decode { .. }));
    assert!(err.is_receive_failure());

    handle.abort();
}
