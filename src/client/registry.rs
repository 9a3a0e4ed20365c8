//! Listener registry.
//!
//! Maps an operation name to exactly one listener. Registering under an
//! existing name replaces the previous listener; there is no fan-out.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::listener::Listener;

// ============================================================================
// Types
// ============================================================================

/// Shared listener handle.
pub type SharedListener = Arc<dyn Listener>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Operation → listener map.
///
/// Lookups clone the listener handle out and release the lock before the
/// listener runs, so a listener may call `on`/`off` without deadlocking and
/// its change applies to the very next envelope.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<FxHashMap<String, SharedListener>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("operations", &self.operations())
            .finish()
    }
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `operation`.
    ///
    /// Returns `true` if a previous listener was replaced.
    pub fn insert(&self, operation: impl Into<String>, listener: SharedListener) -> bool {
        self.listeners
            .lock()
            .insert(operation.into(), listener)
            .is_some()
    }

    /// Removes the listener for `operation`.
    ///
    /// Returns `true` if one was registered.
    pub fn remove(&self, operation: &str) -> bool {
        self.listeners.lock().remove(operation).is_some()
    }

    /// Returns the current listener for `operation`.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<SharedListener> {
        self.listeners.lock().get(operation).cloned()
    }

    /// Returns `true` if `operation` has a listener.
    #[must_use]
    pub fn contains(&self, operation: &str) -> bool {
        self.listeners.lock().contains_key(operation)
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Returns the registered operation names, sorted.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        let mut operations: Vec<_> = self.listeners.lock().keys().cloned().collect();
        operations.sort_unstable();
        operations
    }
}

// ============================================================================
// Tests
// ============================================================================
