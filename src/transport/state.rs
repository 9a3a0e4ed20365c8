//! Connection lifecycle state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle of the client's connection.
///
/// ```text
/// Unconnected --connect()--> Connecting --open--> Open --close--> Closed
///                            Connecting --error--> Unconnected
/// ```
///
/// `Closed` never moves back to `Open` on its own; an explicit `connect()`
/// starts a fresh attempt from `Closed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection has been attempted, or the last attempt failed.
    #[default]
    Unconnected,
    /// A connect attempt is waiting for the transport to open.
    Connecting,
    /// The transport is open and inbound frames are dispatched.
    Open,
    /// The transport was closed by either side.
    Closed,
}

impl ConnectionState {
    /// Returns `true` if frames can be sent.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if a new `connect` may start from this state.
    #[inline]
    #[must_use]
    pub const fn can_connect(self) -> bool {
        matches!(self, Self::Unconnected | Self::Closed)
    }

    /// Returns the state name as a static string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Unconnected);
    }

    #[test]
    fn test_only_open_is_open() {
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(!ConnectionState::Closed.is_open());
        assert!(!ConnectionState::Unconnected.is_open());
    }

    #[test]
    fn test_can_connect() {
        assert!(ConnectionState::Unconnected.can_connect());
        assert!(ConnectionState::Closed.can_connect());
        assert!(!ConnectionState::Connecting.can_connect());
        assert!(!ConnectionState::Open.can_connect());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    }
}
