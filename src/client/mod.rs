//! Operation client.
//!
//! This module provides the main entry point: a [`Client`] that multiplexes
//! named operations over one WebSocket.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connect, send, register listeners |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`Endpoint`] | `wss://<base_url><path>` derivation |
//! | [`Listener`] | Per-operation callback |
//! | [`ListenerRegistry`] | Operation → listener map |
//! | [`ErrorHookSlot`] | Single error hook |
//!
//! # Example
//!
//! ```no_run
//! use opsock::{Client, Result};
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder()
//!     .host("example.com")
//!     .path("/ws")
//!     .on_error(|error, _data| eprintln!("server error: {error}"))
//!     .build()?;
//!
//! client.on("ping", |_error, data| async move {
//!     println!("ping: {data:?}");
//!     Ok(())
//! });
//!
//! client.connect().await?;
//! client.send("ping", &json!({"x": 1}));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Envelope dispatch to listeners and the error hook.
pub(crate) mod dispatch;

/// Endpoint URL derivation.
pub mod endpoint;

/// Error hook slot.
pub mod hook;

/// Listener trait and adapters.
pub mod listener;

/// Operation → listener registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use self::core::Client;
pub use endpoint::Endpoint;
pub use hook::{ErrorHook, ErrorHookSlot};
pub use listener::{JsonListener, Listener};
pub use registry::ListenerRegistry;
