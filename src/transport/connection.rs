//! WebSocket link and event loop.
//!
//! A [`Link`] wraps one live WebSocket. It spawns a tokio task that handles:
//!
//! - Incoming text frames, decoded into the side's inbound message type
//! - Outgoing messages queued through [`Link::send`]
//! - Close classification (clean vs. unclean)
//!
//! The owner receives [`LinkEvent`]s on a channel and decides what a close
//! means (reconnect on the client, wait for the next client on the host).

// ============================================================================
// Imports
// ============================================================================

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::protocol::{Decoded, WireMessage, decode, encode};

// ============================================================================
// Constants
// ============================================================================

/// Global counter distinguishing links, so a superseded link's close is
/// never mistaken for the current one's.
static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// LinkEvent
// ============================================================================

/// Events produced by a link's event loop.
#[derive(Debug)]
pub(crate) enum LinkEvent<In> {
    /// A decoded message.
    Message(In),
    /// A frame that could not be decoded; only this frame is dropped.
    Malformed(Error),
    /// The socket closed. Always the last event.
    Closed {
        /// Close frame received or local shutdown.
        clean: bool,
    },
}

// ============================================================================
// LinkCommand
// ============================================================================

/// Internal commands for the event loop.
enum LinkCommand {
    /// Send an encoded text frame.
    Send(String),
    /// Close the socket.
    Close,
}

// ============================================================================
// Link
// ============================================================================

/// Handle to one live WebSocket.
///
/// Dropping the handle closes the socket.
pub(crate) struct Link<Out> {
    id: u64,
    command_tx: mpsc::UnboundedSender<LinkCommand>,
    _out: PhantomData<fn(Out)>,
}

impl<Out: WireMessage> Link<Out> {
    /// Spawns the event loop for a WebSocket stream.
    ///
    /// Returns the handle and the receiver of inbound events.
    pub(crate) fn spawn<S, In>(
        ws_stream: WebSocketStream<S>,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent<In>>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        In: WireMessage,
    {
        let id = NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(id, ws_stream, command_rx, event_tx));

        (
            Self {
                id,
                command_tx,
                _out: PhantomData,
            },
            event_rx,
        )
    }

    /// Returns this link's id.
    #[inline]
    #[must_use]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Queues a message. Returns `false` if the loop already ended or the
    /// message could not be encoded.
    pub(crate) fn send(&self, message: &Out) -> bool {
        let text = match encode(message) {
            Ok(text) => text,
            Err(e) => {
                warn!(link = self.id, tag = message.tag(), error = %e, "Failed to encode message");
                return false;
            }
        };
        self.command_tx.send(LinkCommand::Send(text)).is_ok()
    }

    /// Asks the event loop to close the socket.
    pub(crate) fn close(&self) {
        let _ = self.command_tx.send(LinkCommand::Close);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S, In>(
        id: u64,
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
        event_tx: mpsc::UnboundedSender<LinkEvent<In>>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        In: WireMessage,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let clean = loop {
            tokio::select! {
                // Incoming frames from the peer
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match decode::<In>(&text) {
                                Ok(Decoded::Message(message)) => {
                                    trace!(link = id, tag = message.tag(), "Message received");
                                    let _ = event_tx.send(LinkEvent::Message(message));
                                }
                                Ok(Decoded::Unknown(tag)) => {
                                    debug!(link = id, %tag, "Ignoring unknown message type");
                                }
                                Err(e) => {
                                    warn!(link = id, error = %e, "Dropping malformed frame");
                                    let _ = event_tx.send(LinkEvent::Malformed(e));
                                }
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(link = id, "WebSocket closed by peer");
                            break true;
                        }

                        Some(Err(e)) => {
                            warn!(link = id, error = %e, "WebSocket error");
                            break false;
                        }

                        None => {
                            debug!(link = id, "WebSocket stream ended");
                            break false;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Outgoing frames from the owner
                command = command_rx.recv() => {
                    match command {
                        Some(LinkCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                warn!(link = id, error = %e, "Failed to send frame");
                                break false;
                            }
                        }

                        Some(LinkCommand::Close) | None => {
                            debug!(link = id, "Closing WebSocket");
                            let _ = ws_write.close().await;
                            break true;
                        }
                    }
                }
            }
        };

        let _ = event_tx.send(LinkEvent::Closed { clean });
        debug!(link = id, clean, "Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================
