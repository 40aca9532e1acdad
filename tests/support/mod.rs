// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Global base address (host:port) used by all tests after the server publishes it.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// Ensure the test server is running and return its host:port.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_addr = Arc::new(OnceLock::<String>::new());
        let published_addr_thread = Arc::clone(&published_addr);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_addr_thread.set(addr.to_string());
                sync_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_addr_and_readiness(published_addr);
    });

    SERVER_ADDR
        .get()
        .expect("server addr should be initialized")
        .as_str()
}

fn wait_for_server_addr_and_readiness(published_addr: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_ADDR.set(addr.clone());

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

// Connect a WebSocket client and return it with the session id the server assigned.
pub async fn connect() -> (Client, String) {
    let url = format!("ws://{}/ws", ensure_server());
    let (mut client, _response) = connect_async(url).await.expect("websocket should connect");

    let identity = recv_until(&mut client, |msg| msg["type"] == "Identity").await;
    let session_id = identity["data"]["session_id"]
        .as_str()
        .expect("identity should carry a session id")
        .to_string();
    (client, session_id)
}

pub async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("send should succeed");
}

pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::text(text.to_string()))
        .await
        .expect("send should succeed");
}

// Read server messages until one matches, failing the test on timeout.
pub async fn recv_until(client: &mut Client, mut matches: impl FnMut(&Value) -> bool) -> Value {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            let msg = client
                .next()
                .await
                .expect("server closed the stream")
                .expect("websocket error");
            let Message::Text(text) = msg else {
                continue;
            };
            let value: Value = serde_json::from_str(text.as_str()).expect("server sends json");
            if matches(&value) {
                return value;
            }
        }
    })
    .await
    .expect("timed out waiting for server message")
}

pub fn roster_has(msg: &Value, session_id: &str) -> bool {
    msg["type"] == "Roster" && msg["data"].get(session_id).is_some()
}

pub fn roster_lacks(msg: &Value, session_id: &str) -> bool {
    msg["type"] == "Roster" && msg["data"].get(session_id).is_none()
}
