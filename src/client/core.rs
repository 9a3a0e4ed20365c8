//! Core client implementation.
//!
//! [`Client`] owns one logical connection slot, the listener registry and
//! the error hook. Cloning a client yields another handle to the same state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, ListenerResult, Result};
use crate::transport::connector;
use crate::transport::{Connection, ConnectionState};

use super::builder::ClientBuilder;
use super::dispatch::Dispatcher;
use super::endpoint::Endpoint;
use super::hook::{ErrorHook, ErrorHookSlot};
use super::listener::{JsonListener, Listener};
use super::registry::ListenerRegistry;

// ============================================================================
// Client
// ============================================================================

/// Multiplexed operation client over a single WebSocket.
///
/// # Example
///
/// ```no_run
/// use opsock::Client;
/// use serde_json::json;
///
/// # async fn example() -> opsock::Result<()> {
/// let client = Client::builder().host("example.com").path("/ws").build()?;
///
/// client.on("chat.message", |error, data| async move {
///     println!("error={error:?} data={data:?}");
///     Ok(())
/// });
///
/// client.connect().await?;
/// client.send("chat.send", &json!({"text": "hello"}));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// Shared client state.
struct ClientInner {
    /// Endpoint the URL was derived from.
    endpoint: Endpoint,
    /// Parsed target URL.
    url: Url,
    /// Optional limit on the opening handshake.
    connect_timeout: Option<Duration>,
    /// Operation listeners.
    registry: Arc<ListenerRegistry>,
    /// Error hook slot.
    error_hook: Arc<ErrorHookSlot>,
    /// Lifecycle state, written by `connect` and the event loop.
    state: Arc<watch::Sender<ConnectionState>>,
    /// Current transport handle.
    connection: Mutex<Option<Connection>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.url.as_str())
            .field("state", &self.state())
            .field("registry", &self.inner.registry)
            .field("error_hook", &self.inner.error_hook)
            .finish()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Creates a new client builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client from validated builder parts.
    pub(crate) fn new(
        endpoint: Endpoint,
        url: Url,
        connect_timeout: Option<Duration>,
        error_hook: Option<ErrorHook>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Unconnected);

        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                url,
                connect_timeout,
                registry: Arc::new(ListenerRegistry::new()),
                error_hook: Arc::new(ErrorHookSlot::new(error_hook)),
                state: Arc::new(state),
                connection: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// Client - Connection
// ============================================================================

impl Client {
    /// Opens the connection.
    ///
    /// Resolves once the transport reports open; inbound dispatch is armed
    /// at that moment. Allowed from `Unconnected` and `Closed` only.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyConnecting`] if another `connect` is in flight
    /// - [`Error::AlreadyConnected`] if the connection is open
    /// - [`Error::Connection`] if the transport fails before opening
    /// - [`Error::ConnectionTimeout`] if a configured timeout elapses
    pub async fn connect(&self) -> Result<()> {
        self.begin_connect()?;

        // A handle left by a remote close is dead; never hand it out again.
        self.inner.connection.lock().take();

        // Falls back to `Unconnected` on failure or if this future is dropped.
        let mut attempt = ConnectAttempt::new(&self.inner.state);

        let stream = connector::open(&self.inner.url, self.inner.connect_timeout).await?;
        attempt.succeed();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let connection = Connection::new(
            stream,
            self.inner.url.as_str(),
            inbound_tx,
            Arc::clone(&self.inner.state),
        );

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.inner.registry),
            Arc::clone(&self.inner.error_hook),
        );
        tokio::spawn(dispatcher.run(connection.id(), inbound_rx));

        info!(connection_id = %connection.id(), url = %self.inner.url, "Client connected");
        *self.inner.connection.lock() = Some(connection);

        Ok(())
    }

    /// Moves `Unconnected`/`Closed` to `Connecting`, rejecting anything else.
    fn begin_connect(&self) -> Result<()> {
        let mut rejection = None;

        self.inner.state.send_if_modified(|state| match *state {
            ConnectionState::Connecting => {
                rejection = Some(Error::AlreadyConnecting);
                false
            }
            ConnectionState::Open => {
                rejection = Some(Error::AlreadyConnected);
                false
            }
            ConnectionState::Unconnected | ConnectionState::Closed => {
                *state = ConnectionState::Connecting;
                true
            }
        });

        match rejection {
            Some(err) => {
                warn!(url = %self.inner.url, error = %err, "Connect rejected");
                Err(err)
            }
            None => {
                debug!(url = %self.inner.url, "Connecting");
                Ok(())
            }
        }
    }

    /// Closes the connection, if any, and waits for its event loop to end.
    ///
    /// The state becomes `Closed`. A later [`connect`](Self::connect) opens
    /// a fresh connection.
    pub async fn close(&self) {
        let connection = self.inner.connection.lock().take();

        if let Some(connection) = connection {
            connection.close().await;
            info!(connection_id = %connection.id(), "Client closed");
        }
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Subscribes to lifecycle changes.
    #[inline]
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Returns `true` if the connection is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Returns the current transport handle.
    ///
    /// `None` before the first successful `connect`, after `close`, and
    /// while or after a `connect` attempt fails. A handle whose remote end
    /// went away stays here, reporting `Closed`, until the next `connect`.
    #[must_use]
    pub fn connection(&self) -> Option<Connection> {
        self.inner.connection.lock().clone()
    }

    /// Returns the target URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Returns the endpoint the URL was derived from.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }
}

// ============================================================================
// Client - Sending
// ============================================================================

impl Client {
    /// Sends `{operation, data}` as one text frame.
    ///
    /// When the connection is not open this does nothing except log a
    /// warning. Use [`try_send`](Self::try_send) to learn whether the frame
    /// was queued.
    pub fn send<T: Serialize + ?Sized>(&self, operation: &str, data: &T) {
        match self.try_send(operation, data) {
            Ok(()) => {}
            Err(Error::NotConnected { .. }) => {
                warn!(operation, state = %self.state(), "WebSocket not ready, skipping send");
            }
            Err(e) => {
                error!(operation, error = %e, "Failed to send frame");
            }
        }
    }

    /// Sends `{operation, data}` as one text frame, reporting failures.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is not open
    /// - [`Error::Json`] if `data` cannot be serialized
    /// - [`Error::ConnectionClosed`] if the connection closed meanwhile
    pub fn try_send<T: Serialize + ?Sized>(&self, operation: &str, data: &T) -> Result<()> {
        if !self.is_open() {
            return Err(Error::not_connected(operation));
        }

        let connection = self.connection();
        match connection {
            Some(connection) => connection.send(operation, data),
            None => Err(Error::not_connected(operation)),
        }
    }
}

// ============================================================================
// Client - Listeners
// ============================================================================

impl Client {
    /// Registers `callback` for `operation`, replacing any previous one.
    ///
    /// The callback receives the envelope's `(error, data)`.
    pub fn on<F, Fut>(&self, operation: impl Into<String>, callback: F)
    where
        F: Fn(Option<String>, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        self.on_listener(operation, callback);
    }

    /// Registers a typed callback; `data` is deserialized into `T` first.
    ///
    /// A payload that does not deserialize counts as a listener failure.
    pub fn on_json<T, F, Fut>(&self, operation: impl Into<String>, callback: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Option<String>, Option<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        self.on_listener(operation, JsonListener::new(callback));
    }

    /// Registers any [`Listener`] implementation for `operation`.
    pub fn on_listener<L: Listener + 'static>(&self, operation: impl Into<String>, listener: L) {
        let operation = operation.into();

        if self
            .inner
            .registry
            .insert(operation.clone(), Arc::new(listener))
        {
            debug!(operation, "Listener replaced");
        } else {
            trace!(operation, "Listener registered");
        }
    }

    /// Removes the listener for `operation`.
    ///
    /// Returns `true` if one was registered.
    pub fn off(&self, operation: &str) -> bool {
        self.inner.registry.remove(operation)
    }

    /// Returns `true` if `operation` has a listener.
    #[must_use]
    pub fn has_listener(&self, operation: &str) -> bool {
        self.inner.registry.contains(operation)
    }

    /// Replaces the error hook.
    pub fn set_error_hook<F>(&self, hook: F)
    where
        F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.error_hook.set(Arc::new(hook));
    }

    /// Removes the error hook.
    pub fn clear_error_hook(&self) {
        self.inner.error_hook.clear();
    }
}

// ============================================================================
// ConnectAttempt
// ============================================================================

/// Resets the state to `Unconnected` unless the attempt succeeded.
struct ConnectAttempt<'a> {
    state: &'a watch::Sender<ConnectionState>,
    succeeded: bool,
}

impl<'a> ConnectAttempt<'a> {
    fn new(state: &'a watch::Sender<ConnectionState>) -> Self {
        Self {
            state,
            succeeded: false,
        }
    }

    fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.succeeded {
            self.state.send_replace(ConnectionState::Unconnected);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
