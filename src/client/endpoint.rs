//! Endpoint URL derivation.
//!
//! The connection target is `wss://<base_url><path>`. When only a host is
//! known, `base_url` defaults to `api.<host>`.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Prefix prepended to a bare host to form the default base URL.
pub const DEFAULT_HOST_PREFIX: &str = "api.";

/// Scheme for TLS connections.
pub const SECURE_SCHEME: &str = "wss";

/// Scheme for plain connections.
pub const PLAIN_SCHEME: &str = "ws";

// ============================================================================
// Endpoint
// ============================================================================

/// Where the client connects.
///
/// `base_url` and `path` are concatenated verbatim, so `path` normally
/// starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    secure: bool,
    base_url: String,
    path: String,
}

impl Endpoint {
    /// Creates a secure endpoint from an explicit base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            secure: true,
            base_url: base_url.into(),
            path: path.into(),
        }
    }

    /// Creates a secure endpoint at `api.<host>`.
    #[must_use]
    pub fn for_host(host: &str, path: impl Into<String>) -> Self {
        Self::new(default_base_url(host), path)
    }

    /// Switches between `wss://` and `ws://`.
    #[inline]
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns the URL scheme.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.secure {
            SECURE_SCHEME
        } else {
            PLAIN_SCHEME
        }
    }

    /// Returns the base URL (host and optional port).
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parses the full URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the concatenation is not a valid
    /// URL with a host.
    pub fn url(&self) -> Result<Url> {
        let raw = format!("{}://{}{}", self.scheme(), self.base_url, self.path);
        if self.base_url.trim().is_empty() {
            return Err(Error::invalid_url(raw, "missing host"));
        }

        let url = Url::parse(&raw).map_err(|e| Error::invalid_url(&raw, e))?;

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_url(raw, "missing host"));
        }

        Ok(url)
    }
}

/// Returns `api.<host>`.
#[inline]
#[must_use]
pub fn default_base_url(host: &str) -> String {
    format!("{DEFAULT_HOST_PREFIX}{host}")
}

// ============================================================================
// Tests
// ============================================================================
