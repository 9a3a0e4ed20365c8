//! Operation listeners.
//!
//! A listener receives `(error, data)` for every envelope naming its
//! operation. Any async closure of that shape is a listener:
//!
//! ```ignore
//! client.on("chat.message", |error, data| async move {
//!     if let Some(error) = error {
//!         tracing::warn!(%error, "chat failed");
//!     }
//!     println!("{data:?}");
//!     Ok(())
//! });
//! ```
//!
//! Returning `Err` (or panicking) marks the call as failed. Failures are
//! logged by the dispatcher and go no further.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, from_value};

use crate::error::ListenerResult;

// ============================================================================
// Listener
// ============================================================================

/// Callback for one operation.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Handles one envelope.
    ///
    /// `error` and `data` mirror the envelope's optional fields.
    async fn call(&self, error: Option<String>, data: Option<Value>) -> ListenerResult;
}

#[async_trait]
impl<F, Fut> Listener for F
where
    F: Fn(Option<String>, Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = ListenerResult> + Send + 'static,
{
    async fn call(&self, error: Option<String>, data: Option<Value>) -> ListenerResult {
        (self)(error, data).await
    }
}

// ============================================================================
// JsonListener
// ============================================================================

/// Listener that deserializes `data` into `T` before calling `f`.
///
/// A payload that does not fit `T` fails the call.
pub struct JsonListener<T, F> {
    f: F,
    _payload: PhantomData<fn() -> T>,
}

impl<T, F> JsonListener<T, F> {
    /// Wraps a typed callback.
    #[inline]
    #[must_use]
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(Option<String>, Option<T>) -> Fut,
        Fut: Future<Output = ListenerResult>,
    {
        Self {
            f,
            _payload: PhantomData,
        }
    }
}

impl<T, F> fmt::Debug for JsonListener<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonListener")
            .field("payload", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T, F, Fut> Listener for JsonListener<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(Option<String>, Option<T>) -> Fut + Send + Sync,
    Fut: Future<Output = ListenerResult> + Send + 'static,
{
    async fn call(&self, error: Option<String>, data: Option<Value>) -> ListenerResult {
        let payload = data.map(from_value::<T>).transpose()?;
        (self.f)(error, payload).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;

    use crate::error::ListenerError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i64,
    }

    #[tokio::test]
    async fn test_closure_is_listener() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let listener = move |error: Option<String>, data: Option<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock() = Some((error, data));
                Ok::<(), ListenerError>(())
            }
        };

        listener
            .call(None, Some(json!({"x": 1})))
            .await
            .expect("call");

        assert_eq!(*seen.lock(), Some((None, Some(json!({"x": 1})))));
    }

    #[tokio::test]
    async fn test_closure_error_is_returned() {
        let listener = |_error: Option<String>, _data: Option<Value>| async {
            Err::<(), ListenerError>("nope".into())
        };

        let err = listener.call(None, None).await.expect_err("fails");
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn test_json_listener_decodes_payload() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let listener = JsonListener::new(move |_error, point: Option<Point>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock() = point;
                Ok(())
            }
        });

        listener
            .call(None, Some(json!({"x": 7})))
            .await
            .expect("call");
        assert_eq!(*seen.lock(), Some(Point { x: 7 }));
    }

    #[tokio::test]
    async fn test_json_listener_missing_data_is_none() {
        let listener = JsonListener::new(|error: Option<String>, point: Option<Point>| async move {
            assert_eq!(error.as_deref(), Some("boom"));
            assert!(point.is_none());
            Ok(())
        });

        listener
            .call(Some("boom".to_string()), None)
            .await
            .expect("call");
    }

    #[tokio::test]
    async fn test_json_listener_rejects_wrong_shape() {
        let listener =
            JsonListener::new(|_error, _point: Option<Point>| async { Ok(()) });

        let result = listener.call(None, Some(json!("not a point"))).await;
        assert!(result.is_err());
    }
}
