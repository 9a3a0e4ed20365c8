//! Local WebSocket peer for tests.
//!
//! Binds `127.0.0.1:0`, accepts one client and exposes the server half so
//! tests can script exactly which frames the client sees.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// How long a test waits for the client before failing.
const PEER_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Logging
// ============================================================================

/// Routes `tracing` output to the test harness, filtered by `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TestServer
// ============================================================================

/// A bound listener; each `accept` takes the next client.
pub(crate) struct TestServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TestServer {
    /// Binds to a random localhost port.
    pub(crate) async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr");
        Self { listener, addr }
    }

    /// Returns `host:port`, usable as a client base URL.
    pub(crate) fn authority(&self) -> String {
        self.addr.to_string()
    }

    /// Returns the plain `ws://` URL for `path`.
    pub(crate) fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }

    /// Accepts one client and completes the upgrade.
    pub(crate) async fn accept(&self) -> TestPeer {
        self.accept_after(Duration::ZERO).await
    }

    /// Accepts TCP, waits `delay`, then completes the upgrade.
    pub(crate) async fn accept_after(&self, delay: Duration) -> TestPeer {
        let (stream, _) = timeout(PEER_TIMEOUT, self.listener.accept())
            .await
            .expect("client should connect")
            .expect("accept");

        tokio::time::sleep(delay).await;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade should succeed");
        TestPeer { ws }
    }
}

// ============================================================================
// TestPeer
// ============================================================================

/// Server half of an accepted connection.
pub(crate) struct TestPeer {
    ws: WebSocketStream<TcpStream>,
}

impl TestPeer {
    /// Sends one text frame to the client.
    pub(crate) async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .expect("send to client");
    }

    /// Sends one binary frame to the client.
    pub(crate) async fn send_binary(&mut self, bytes: &[u8]) {
        self.ws
            .send(Message::Binary(bytes.to_vec().into()))
            .await
            .expect("send to client");
    }

    /// Waits for the next text frame from the client.
    pub(crate) async fn recv_text(&mut self) -> String {
        loop {
            let message = timeout(PEER_TIMEOUT, self.ws.next())
                .await
                .expect("client should send")
                .expect("stream open")
                .expect("frame");

            if let Message::Text(text) = message {
                return text.to_string();
            }
        }
    }

    /// Waits for the next text frame and parses it as JSON.
    pub(crate) async fn recv_json(&mut self) -> Value {
        let text = self.recv_text().await;
        serde_json::from_str(&text).expect("client frames are JSON")
    }

    /// Returns `true` if no text frame arrives within `window`.
    pub(crate) async fn is_quiet_for(&mut self, window: Duration) -> bool {
        match timeout(window, self.ws.next()).await {
            Err(_) => true,
            Ok(Some(Ok(Message::Text(_)))) => false,
            Ok(_) => true,
        }
    }

    /// Closes the connection from the server side.
    pub(crate) async fn close(mut self) {
        let _ = self.ws.close(None).await;
        // Drain until the client acknowledges.
        while let Ok(Some(Ok(_))) = timeout(PEER_TIMEOUT, self.ws.next()).await {}
    }
}
