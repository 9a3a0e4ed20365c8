//! opsock - Multiplexed operation client over a single WebSocket.
//!
//! Many logical *operations* share one physical connection. Every frame is
//! a JSON envelope naming its operation; inbound envelopes are routed to
//! the listener registered for that operation, and any envelope carrying an
//! `error` also reaches a single error hook.
//!
//! # Architecture
//!
//! - **Connection manager** ([`Client::connect`], [`Client::send`]): owns
//!   the transport and its lifecycle
//! - **Listener registry** ([`Client::on`]): one listener per operation,
//!   last registration wins
//! - **Envelope codec** ([`protocol`]): `{operation, data}` out,
//!   `{operation, data?, error?}` in, malformed frames dropped
//! - **Error hook** ([`ClientBuilder::on_error`]): notified of every
//!   server-signaled error
//!
//! # Quick Start
//!
//! ```no_run
//! use opsock::{Client, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Connects to wss://api.example.com/ws
//!     let client = Client::builder().host("example.com").path("/ws").build()?;
//!
//!     client.on("chat.message", |error, data| async move {
//!         match error {
//!             Some(error) => eprintln!("chat error: {error}"),
//!             None => println!("chat: {data:?}"),
//!         }
//!         Ok(())
//!     });
//!
//!     client.connect().await?;
//!     client.send("chat.send", &json!({"text": "hello"}));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], builder, listeners, error hook |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Envelope codec |
//! | [`transport`] | WebSocket transport layer |
//!
//! # Guarantees
//!
//! - `connect` resolves only after the transport is open
//! - `send` on a connection that is not open writes nothing
//! - Envelopes are dispatched one at a time in arrival order
//! - A failing or panicking listener never stops dispatch
//! - No automatic reconnection, retries, or send queueing

// ============================================================================
// Modules
// ============================================================================

/// Operation client: connect, send, listen.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Envelope wire format.
pub mod protocol;

/// WebSocket transport layer.
///
/// Handles the handshake, the per-connection event loop and lifecycle state.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, Endpoint, JsonListener, Listener};

// Error types
pub use error::{Error, ListenerError, ListenerResult, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Protocol types
pub use protocol::{Envelope, OutboundEnvelope};

// Transport types
pub use transport::{Connection, ConnectionState};
