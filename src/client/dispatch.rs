//! Inbound envelope dispatch.
//!
//! For every decoded envelope, in arrival order:
//!
//! 1. Look up the operation's listener (fresh per envelope) and await it
//!    inside a failure boundary
//! 2. If the envelope carries a non-empty error, notify the error hook
//!
//! Step 2 runs whether or not step 1 found a listener, and whether or not
//! the listener failed.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, trace};

use crate::identifiers::ConnectionId;
use crate::protocol::Envelope;
use crate::transport::connection::InboundReceiver;

use super::hook::ErrorHookSlot;
use super::registry::ListenerRegistry;

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes envelopes to listeners and the error hook.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    registry: Arc<ListenerRegistry>,
    error_hook: Arc<ErrorHookSlot>,
}

impl Dispatcher {
    /// Creates a dispatcher over shared registry and hook slot.
    pub(crate) fn new(registry: Arc<ListenerRegistry>, error_hook: Arc<ErrorHookSlot>) -> Self {
        Self {
            registry,
            error_hook,
        }
    }

    /// Drains `inbound` until the connection's event loop drops its sender.
    pub(crate) async fn run(self, connection_id: ConnectionId, mut inbound: InboundReceiver) {
        while let Some(envelope) = inbound.recv().await {
            self.dispatch(envelope).await;
        }

        debug!(%connection_id, "Dispatcher finished");
    }

    /// Dispatches one envelope.
    pub(crate) async fn dispatch(&self, envelope: Envelope) {
        let notify = envelope.has_error();
        let Envelope {
            operation,
            data,
            error,
        } = envelope;
        let operation_name = operation.as_deref().unwrap_or_default();

        // The hook runs after the listener, which consumes its own copy.
        let hook_args = notify.then(|| (error.clone(), data.clone()));

        match operation.as_deref().and_then(|name| self.registry.get(name)) {
            Some(listener) => {
                let outcome = AssertUnwindSafe(listener.call(error, data))
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(())) => trace!(operation = operation_name, "Listener completed"),
                    Ok(Err(e)) => {
                        error!(operation = operation_name, error = %e, "Listener failed");
                    }
                    Err(panic) => {
                        error!(
                            operation = operation_name,
                            panic = %panic_message(&*panic),
                            "Listener panicked"
                        );
                    }
                }
            }

            None => trace!(operation = operation_name, "No listener for operation"),
        }

        if let Some((Some(error), data)) = hook_args {
            debug!(operation = operation_name, error, "Envelope carries error");
            self.error_hook.notify(&error, data.as_ref());
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
