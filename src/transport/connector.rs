//! Outbound WebSocket handshake.
//!
//! # Connection Flow
//!
//! 1. TCP (and TLS for `wss://`) connect to the endpoint
//! 2. HTTP upgrade to WebSocket
//! 3. Handshake response received: the transport is open
//!
//! Only after step 3 does the caller build a [`Connection`](super::Connection)
//! and arm inbound dispatch.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Once;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream, plain or TLS.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Crypto Provider
// ============================================================================

static INSTALL_CRYPTO_PROVIDER: Once = Once::new();

/// Installs the process-wide rustls provider before the first `wss://` connect.
fn ensure_crypto_provider() {
    INSTALL_CRYPTO_PROVIDER.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }
    });
}

// ============================================================================
// Open
// ============================================================================

/// Opens a WebSocket to `url`.
///
/// Returns once the server has accepted the upgrade.
///
/// # Errors
///
/// - [`Error::Connection`] if TCP, TLS or the upgrade fails
/// - [`Error::ConnectionTimeout`] if `connect_timeout` elapses first
pub async fn open(url: &Url, connect_timeout: Option<Duration>) -> Result<WsStream> {
    if url.scheme() == "wss" {
        ensure_crypto_provider();
    }

    debug!(%url, "Opening WebSocket");

    let handshake = connect_async(url.as_str());
    let outcome = match connect_timeout {
        Some(limit) => timeout(limit, handshake)
            .await
            .map_err(|_| timeout_error(limit))?,
        None => handshake.await,
    };

    let (stream, response) = outcome.map_err(|e| {
        warn!(%url, error = %e, "WebSocket handshake failed");
        Error::connection(e.to_string())
    })?;

    info!(%url, status = %response.status(), "WebSocket connection established");

    Ok(stream)
}

/// Reports an elapsed handshake limit in whole milliseconds, saturating.
fn timeout_error(limit: Duration) -> Error {
    Error::connection_timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Tests
// ============================================================================
