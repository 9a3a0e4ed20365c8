//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use opsock::Client;
//!
//! # fn example() -> opsock::Result<()> {
//! let client = Client::builder()
//!     .host("example.com")
//!     .path("/ws")
//!     .on_error(|error, _data| eprintln!("server error: {error}"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{Error, Result};

use super::core::Client;
use super::endpoint::Endpoint;
use super::hook::ErrorHook;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ClientBuilder {
    /// Path appended to the base URL.
    path: String,
    /// Host used to derive `api.<host>`.
    host: Option<String>,
    /// Explicit base URL, wins over `host`.
    base_url: Option<String>,
    /// `wss://` when true, `ws://` otherwise.
    secure: bool,
    /// Optional limit on the opening handshake.
    connect_timeout: Option<Duration>,
    /// Error hook installed at construction.
    error_hook: Option<ErrorHook>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            path: String::new(),
            host: None,
            base_url: None,
            secure: true,
            connect_timeout: None,
            error_hook: None,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("path", &self.path)
            .field("host", &self.host)
            .field("base_url", &self.base_url)
            .field("secure", &self.secure)
            .field("connect_timeout", &self.connect_timeout)
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with no endpoint configured.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path appended to the base URL (e.g. `/ws`).
    #[inline]
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the host; the base URL becomes `api.<host>`.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the base URL explicitly (host with optional port).
    ///
    /// Takes precedence over [`host`](Self::host).
    #[inline]
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Chooses `wss://` (default) or `ws://`.
    #[inline]
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Bounds how long `connect` waits for the transport to open.
    ///
    /// Without this, `connect` waits as long as the transport does.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Installs the error hook.
    #[inline]
    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if neither host nor base URL is set
    /// - [`Error::InvalidUrl`] if the resulting URL does not parse
    pub fn build(self) -> Result<Client> {
        let endpoint = self.validate_endpoint()?;
        let url = endpoint.url()?;

        Ok(Client::new(
            endpoint,
            url,
            self.connect_timeout,
            self.error_hook,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Resolves the endpoint from `base_url` or `host`.
    fn validate_endpoint(&self) -> Result<Endpoint> {
        let endpoint = match (&self.base_url, &self.host) {
            (Some(base_url), _) => Endpoint::new(base_url.clone(), self.path.clone()),
            (None, Some(host)) => Endpoint::for_host(host, self.path.clone()),
            (None, None) => {
                return Err(Error::config(
                    "Endpoint is required. Use .host() or .base_url() to set it.\n\
                     Example: Client::builder().host(\"example.com\").path(\"/ws\")",
                ));
            }
        };

        Ok(endpoint.with_secure(self.secure))
    }
}

// ============================================================================
// Tests
// ============================================================================
