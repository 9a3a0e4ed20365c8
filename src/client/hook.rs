//! Error hook.
//!
//! A single replaceable slot notified whenever an inbound envelope carries
//! a non-empty `error`. Unset by default, in which case nothing happens.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::error;

use super::dispatch::panic_message;

// ============================================================================
// Types
// ============================================================================

/// Error hook callback: `(error, data)`.
pub type ErrorHook = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

// ============================================================================
// ErrorHookSlot
// ============================================================================

/// Holder for the optional [`ErrorHook`].
#[derive(Default)]
pub struct ErrorHookSlot {
    hook: Mutex<Option<ErrorHook>>,
}

impl fmt::Debug for ErrorHookSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHookSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

impl ErrorHookSlot {
    /// Creates a slot holding `hook`.
    #[inline]
    #[must_use]
    pub fn new(hook: Option<ErrorHook>) -> Self {
        Self {
            hook: Mutex::new(hook),
        }
    }

    /// Replaces the hook.
    pub fn set(&self, hook: ErrorHook) {
        *self.hook.lock() = Some(hook);
    }

    /// Removes the hook.
    pub fn clear(&self) {
        *self.hook.lock() = None;
    }

    /// Returns `true` if a hook is set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.hook.lock().is_some()
    }

    /// Invokes the hook, if any.
    ///
    /// A panicking hook is logged and swallowed.
    pub fn notify(&self, error: &str, data: Option<&Value>) {
        let Some(hook) = self.hook.lock().clone() else {
            return;
        };

        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| hook(error, data))) {
            error!(error, panic = %panic_message(&*panic), "Error hook panicked");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
