//! Events surfaced by both transport sides.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

// ============================================================================
// TransportEvent
// ============================================================================

/// Notification emitted by a transport to its owner.
///
/// `M` is the inbound message type of that side.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent<M> {
    /// The channel opened (client) or a client attached (host).
    Connected,

    /// The channel closed.
    Disconnected {
        /// `true` for close-frame or local shutdown, `false` for network
        /// failures and stale heartbeats.
        clean: bool,
    },

    /// A decoded inbound message.
    Message(M),

    /// A non-fatal error: failed open, malformed frame, socket error.
    Error(String),

    /// Reconnection attempts are exhausted; nothing further happens until
    /// the owner calls `connect()` again.
    MaxRetries,
}

impl<M> TransportEvent<M> {
    /// Returns `true` for the terminal max-retries signal.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MaxRetries)
    }
}

/// Receiving half of a transport's event stream.
pub type EventReceiver<M> = mpsc::UnboundedReceiver<TransportEvent<M>>;

/// Sending half of a transport's event stream.
pub(crate) type EventSender<M> = mpsc::UnboundedSender<TransportEvent<M>>;
