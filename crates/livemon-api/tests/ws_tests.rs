//! End-to-end `WebSocket` tests using a real client over TCP.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use livemon_api::router::build_router;
use livemon_api::server::{ServerConfig, ServerError, bind, serve};
use livemon_api::state::AppState;
use livemon_api::{StartupError, spawn_ws_server};
use livemon_core::{BroadcastHub, Clock, ManualClock, SnapshotGenerator, TickOutcome};
use livemon_types::Channel;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn test_state() -> (Arc<AppState>, Arc<BroadcastHub>) {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_700_000_000_000));
    let generator = SnapshotGenerator::seeded(7, clock.now_millis());
    let hub = Arc::new(BroadcastHub::with_parts(100, clock, generator));
    (Arc::new(AppState::new(Arc::clone(&hub))), hub)
}

fn loopback(port: u16) -> ServerConfig {
    ServerConfig {
        host: String::from("127.0.0.1"),
        port,
    }
}

/// Boot a server on an ephemeral port and return its `ws://` URL.
async fn boot_server() -> (String, Arc<BroadcastHub>) {
    let (state, hub) = test_state();
    let listener = bind(&loopback(0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, build_router(state), std::future::pending()));

    (format!("ws://{addr}/ws"), hub)
}

async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Connect and consume the `connected` greeting.
async fn connect(url: &str) -> (WsStream, Value) {
    let (mut ws, _) = connect_async(url).await.unwrap();
    let greeting = next_json(&mut ws).await;
    assert_eq!(greeting["type"], "connected");
    (ws, greeting)
}

async fn wait_for_connections(hub: &BroadcastHub, expected: usize) {
    timeout(TIMEOUT, async {
        while hub.connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn greeting_carries_client_id() {
    let (url, _) = boot_server().await;
    let (_ws, greeting) = connect(&url).await;
    assert!(greeting["payload"]["clientId"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(greeting["payload"]["timestamp"], 1_700_000_000_000_i64);
}

#[tokio::test]
async fn sovereignty_tick_reaches_every_client_once() {
    let (url, hub) = boot_server().await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(connect(&url).await.0);
    }

    assert_eq!(
        hub.tick(Channel::Sovereignty).await,
        TickOutcome::Delivered { recipients: 3 }
    );

    let mut payloads = Vec::new();
    for ws in &mut clients {
        let frame = next_json(ws).await;
        assert_eq!(frame["type"], "sovereignty_update");
        let consensus = frame["payload"]["consensusOmnibus"].as_f64().unwrap();
        assert!((99.0..=100.0).contains(&consensus));
        payloads.push(frame["payload"].clone());
    }
    assert!(payloads.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let (url, _) = boot_server().await;
    let (mut ws, _) = connect(&url).await;

    ws.send(Message::text("this is not json")).await.unwrap();
    ws.send(Message::text(r#"{"type":"dance"}"#)).await.unwrap();
    ws.send(Message::text(r#"{"type":"subscribe","channels":["logs"]}"#))
        .await
        .unwrap();

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "subscribed");
    assert_eq!(reply["payload"]["channels"], serde_json::json!(["logs"]));
}

#[tokio::test]
async fn closing_client_is_unregistered() {
    let (url, hub) = boot_server().await;
    let (mut ws, _) = connect(&url).await;
    let (_other, _) = connect(&url).await;
    wait_for_connections(&hub, 2).await;

    ws.close(None).await.unwrap();
    wait_for_connections(&hub, 1).await;

    assert_eq!(
        hub.tick(Channel::Wallet).await,
        TickOutcome::Delivered { recipients: 1 }
    );
}

/// Send a bare HTTP/1.1 GET and return the status line.
async fn http_status_line(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    timeout(TIMEOUT, stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_owned()
}

#[tokio::test]
async fn dedicated_listener_serves_only_the_socket() {
    let (state, hub) = test_state();
    let listener = spawn_ws_server(&loopback(0), state).await.unwrap();
    let addr = listener.local_addr();
    assert_ne!(addr.port(), 0);

    let (_ws, greeting) = connect(&format!("ws://{addr}/ws")).await;
    assert!(greeting["payload"]["clientId"].is_string());
    wait_for_connections(&hub, 1).await;

    let status = http_status_line(addr, "/health").await;
    assert!(status.starts_with("HTTP/1.1 404"), "{status}");

    listener.abort();
}

#[tokio::test]
async fn dedicated_listener_reports_taken_port() {
    let (state, _) = test_state();
    let occupied = bind(&loopback(0)).await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let result = spawn_ws_server(&loopback(port), state).await;
    assert!(matches!(
        result,
        Err(StartupError::Server(ServerError::Bind(_)))
    ));
}
