//! WebSocket connection and event loop.
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming text frames, decoded into envelopes and forwarded in order
//! - Outgoing frames queued by [`Connection::send`]
//! - Close from either side, which ends the loop and marks the state `Closed`
//!
//! Decoded envelopes go to an unbounded channel drained by a separate
//! dispatch task, so a slow listener never stalls reads or writes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::{Envelope, OutboundEnvelope};

use super::connector::WsStream;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Sender side of the decoded inbound envelope stream.
pub type InboundSender = mpsc::UnboundedSender<Envelope>;

/// Receiver side of the decoded inbound envelope stream.
pub type InboundReceiver = mpsc::UnboundedReceiver<Envelope>;

/// Shared lifecycle state published to the owning client.
pub type StateSender = Arc<watch::Sender<ConnectionState>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write one text frame.
    Send(String),
    /// Close the connection and acknowledge once the loop has exited.
    Shutdown(oneshot::Sender<()>),
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to one open WebSocket connection.
///
/// Cloning yields another handle to the same connection.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. Sending only queues a frame for the event
/// loop and never blocks.
#[derive(Clone)]
pub struct Connection {
    /// Connection identifier.
    id: ConnectionId,
    /// Endpoint URL.
    url: Arc<str>,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Cleared by the event loop on exit.
    open: Arc<AtomicBool>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Connection {
    /// Creates a connection from an opened WebSocket stream.
    ///
    /// Publishes `Open` on `state`, then spawns the event loop. Every text
    /// frame received from here on is decoded and pushed to `inbound`.
    pub(crate) fn new(
        ws_stream: WsStream,
        url: impl Into<Arc<str>>,
        inbound: InboundSender,
        state: StateSender,
    ) -> Self {
        let id = ConnectionId::generate();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        state.send_replace(ConnectionState::Open);

        tokio::spawn(Self::run_event_loop(
            id,
            ws_stream,
            command_rx,
            inbound,
            Arc::clone(&open),
            state,
        ));

        Self {
            id,
            url: url.into(),
            command_tx,
            open,
        }
    }

    /// Returns the connection identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` while the event loop is running.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.command_tx.is_closed()
    }

    /// Returns the state of this particular connection.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    /// Encodes `{operation, data}` and queues it as one text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is no longer open
    /// - [`Error::Json`] if `data` cannot be serialized
    /// - [`Error::ConnectionClosed`] if the event loop exited meanwhile
    pub fn send<T: Serialize + ?Sized>(&self, operation: &str, data: &T) -> Result<()> {
        if !self.is_open() {
            return Err(Error::not_connected(operation));
        }

        let text = OutboundEnvelope::new(operation, data).encode()?;
        self.send_text(text)?;

        trace!(connection_id = %self.id, operation, "Frame queued");
        Ok(())
    }

    /// Queues a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has exited.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Closes the connection and waits for the event loop to exit.
    ///
    /// Closing an already closed connection is a no-op.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self
            .command_tx
            .send(ConnectionCommand::Shutdown(ack_tx))
            .is_err()
        {
            return;
        }

        // Sender dropped means the loop ended on its own.
        let _ = ack_rx.await;
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        id: ConnectionId,
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        inbound: InboundSender,
        open: Arc<AtomicBool>,
        state: StateSender,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut shutdown_ack = None;

        loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_text(id, &text, &inbound);
                        }

                        Some(Ok(Message::Binary(bytes))) => {
                            warn!(connection_id = %id, len = bytes.len(), "Dropping binary frame");
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(connection_id = %id, ?frame, "WebSocket closed by remote");
                            // Flushes the close reply queued by tungstenite.
                            let _ = ws_write.close().await;
                            break;
                        }

                        Some(Err(e)) => {
                            error!(connection_id = %id, error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!(connection_id = %id, "WebSocket stream ended");
                            break;
                        }

                        // Ping/Pong are answered by tungstenite
                        _ => {}
                    }
                }

                // Commands from the client API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                warn!(connection_id = %id, error = %e, "Failed to write frame");
                                break;
                            }
                        }

                        Some(ConnectionCommand::Shutdown(ack)) => {
                            debug!(connection_id = %id, "Shutdown command received");
                            let _ = ws_write.close().await;
                            shutdown_ack = Some(ack);
                            break;
                        }

                        None => {
                            debug!(connection_id = %id, "Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        open.store(false, Ordering::Release);
        state.send_if_modified(|current| {
            if current.is_open() {
                *current = ConnectionState::Closed;
                true
            } else {
                false
            }
        });

        if let Some(ack) = shutdown_ack {
            let _ = ack.send(());
        }

        debug!(connection_id = %id, "Event loop terminated");
    }

    /// Decodes one text frame and forwards it for dispatch.
    ///
    /// Malformed frames are dropped here and never reach a listener.
    fn handle_incoming_text(id: ConnectionId, text: &str, inbound: &InboundSender) {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(connection_id = %id, error = %e, text, "Failed to parse incoming frame");
                return;
            }
        };

        trace!(
            connection_id = %id,
            operation = envelope.operation_or_default(),
            "Frame received"
        );

        if inbound.send(envelope).is_err() {
            debug!(connection_id = %id, "Dispatcher gone, dropping frame");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
