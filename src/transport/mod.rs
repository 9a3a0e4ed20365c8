//! WebSocket transport layer.
//!
//! This module owns the physical connection: opening it, running its
//! event loop, and publishing its lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │                              │  Server         │
//! │                 │         WebSocket            │                 │
//! │  connector      │─────────────────────────────►│  /path          │
//! │  → Connection   │◄────────────────────────────►│                 │
//! │                 │   wss://<base_url><path>     │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `connector::open` - Handshake with the server
//! 2. `Connection::new` - Publish `Open`, spawn the event loop
//! 3. `Connection::send` - Queue frames
//! 4. Close from either side - Loop exits, state becomes `Closed`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `connector` | Outbound handshake |
//! | `state` | Lifecycle state |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Outbound WebSocket handshake.
pub mod connector;

/// Connection lifecycle state.
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use state::ConnectionState;
