//! Error types for the operation client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use opsock::{Client, Result};
//!
//! async fn example() -> Result<()> {
//!     let client = Client::builder().host("example.com").path("/ws").build()?;
//!     client.connect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Lifecycle | [`Error::AlreadyConnecting`], [`Error::AlreadyConnected`], [`Error::NotConnected`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |
//!
//! Failures raised by listener callbacks are not part of this enum: they
//! use [`ListenerError`] and never leave the dispatch loop.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

/// Error type returned by listener callbacks.
///
/// Boxed so listeners can bubble up anything with `?`.
pub type ListenerError = Box<dyn StdError + Send + Sync>;

/// Result type returned by listener callbacks.
pub type ListenerResult = StdResult<(), ListenerError>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the client builder is missing required settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// The assembled endpoint URL could not be parsed.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The URL as assembled from scheme, base URL and path.
        url: String,
        /// Parser message.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed before it opened.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt did not open within the configured timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection is closed.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// `connect` was called while another attempt is in flight.
    #[error("Connect already in progress")]
    AlreadyConnecting,

    /// `connect` was called while the connection is open.
    #[error("Already connected")]
    AlreadyConnected,

    /// A frame was offered while no open connection exists.
    #[error("Not connected, dropping operation: {operation}")]
    NotConnected {
        /// Operation of the dropped frame.
        operation: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(operation: impl Into<String>) -> Self {
        Self::NotConnected {
            operation: operation.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the call was rejected because of the lifecycle
    /// state rather than a transport failure.
    #[inline]
    #[must_use]
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyConnecting | Self::AlreadyConnected | Self::NotConnected { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
