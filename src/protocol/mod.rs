//! WebSocket protocol message types.
//!
//! Many logical operations share one connection. Each frame is a JSON
//! envelope naming its operation.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `OutboundEnvelope` | Client → Server | `{operation, data}` |
//! | `Envelope` | Server → Client | `{operation, data?, error?}` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Envelope encoding and decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Envelope encoding and decoding.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, OutboundEnvelope};
