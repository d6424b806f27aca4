//! Transport Tests (sdcp-transport)
//!
//! Loopback tests for the WebSocket and UDP transports.

use bytes::Bytes;
use sdcp_transport::{
    Connector, FrameListener, FrameReceiver, FrameSender, TransportError, TransportEvent,
    UdpTransport, WebSocketReceiver, WebSocketSender, WebSocketServer, WebSocketTransport,
};
use std::time::Duration;
use tokio::time::timeout;

async fn next_frame<R: FrameReceiver>(receiver: &mut R) -> Option<Bytes> {
    loop {
        match timeout(Duration::from_secs(5), receiver.recv()).await.ok()?? {
            TransportEvent::Frame(frame) => return Some(frame),
            TransportEvent::Opened => continue,
            _ => return None,
        }
    }
}

/// A connected client/server pair on loopback
async fn pair() -> (
    (WebSocketSender, WebSocketReceiver),
    (WebSocketSender, WebSocketReceiver),
) {
    let mut server = WebSocketServer::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    let accept = tokio::spawn(async move { server.accept().await.unwrap() });

    let url = format!("ws://127.0.0.1:{}/websocket", port);
    let client = WebSocketTransport::connect(&url).await.unwrap();
    let (tx, rx, _) = accept.await.unwrap();

    (client, (tx, rx))
}

#[tokio::test]
async fn test_websocket_text_roundtrip() {
    let ((client_tx, mut client_rx), (server_tx, mut server_rx)) = pair().await;

    client_tx
        .send(Bytes::from_static(br#"{"Topic":"sdcp/request/A1B2"}"#))
        .await
        .unwrap();
    let got = next_frame(&mut server_rx).await.expect("server got nothing");
    assert_eq!(got.as_ref(), br#"{"Topic":"sdcp/request/A1B2"}"#);

    server_tx
        .send(Bytes::from_static(br#"{"Topic":"sdcp/response/A1B2"}"#))
        .await
        .unwrap();
    let got = next_frame(&mut client_rx).await.expect("client got nothing");
    assert_eq!(got.as_ref(), br#"{"Topic":"sdcp/response/A1B2"}"#);
}

#[tokio::test]
async fn test_concurrent_senders_share_one_connection() {
    let ((client_tx, _client_rx), (_server_tx, mut server_rx)) = pair().await;
    let client_tx = std::sync::Arc::new(client_tx);

    let sends: Vec<_> = (0..8)
        .map(|i| {
            let tx = client_tx.clone();
            tokio::spawn(async move { tx.send(Bytes::from(format!("{{\"n\":{}}}", i))).await })
        })
        .collect();
    for send in sends {
        send.await.unwrap().unwrap();
    }

    for _ in 0..8 {
        assert!(next_frame(&mut server_rx).await.is_some());
    }
}

#[tokio::test]
async fn test_close_is_reported_to_peer() {
    let ((_client_tx, mut client_rx), (server_tx, _server_rx)) = pair().await;

    server_tx.close().await.unwrap();
    assert!(!server_tx.is_open());
    assert!(matches!(
        server_tx.send(Bytes::from_static(b"{}")).await,
        Err(TransportError::Closed)
    ));

    let mut closed = false;
    while let Ok(Some(event)) = timeout(Duration::from_secs(5), client_rx.recv()).await {
        if let TransportEvent::Closed { .. } = event {
            closed = true;
            break;
        }
    }
    assert!(closed, "client should observe the close");
}

#[tokio::test]
async fn test_dial_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("ws://127.0.0.1:{}/websocket", port);
    assert!(matches!(
        WebSocketTransport::connect(&url).await,
        Err(TransportError::Dial(_))
    ));
}

#[tokio::test]
async fn test_udp_send_recv() {
    let server = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    let client = UdpTransport::bind("127.0.0.1:0").await.unwrap();

    client
        .send_to(b"M99999", server.local_addr().unwrap())
        .await
        .unwrap();

    let (datagram, from) = timeout(Duration::from_secs(5), server.recv_from())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(datagram.as_ref(), b"M99999");
    assert_eq!(from.port(), client.local_addr().unwrap().port());
}
