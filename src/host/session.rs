//! Host session.
//!
//! Owns the host transport, the selection cache and the host's intent
//! (inspect mode, multi-select). The owner drives it by awaiting
//! [`HostSession::next_event`] in a loop; commands are plain method calls.
//!
//! On every `ready` from a client the cache is reset and the intent is
//! re-sent, after which the client replays its staged snapshot.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;

use tracing::{debug, info, trace, warn};

use crate::config::ClientOptions;
use crate::error::Result;
use crate::identifiers::{SessionId, StagedId, SubscriptionId};
use crate::protocol::{ClientMessage, HostMessage, Measurement, StagedElementWire};
use crate::subscribers::Subscribers;
use crate::transport::{EventReceiver, HostTransport, TransportEvent};

use super::bootstrap;
use super::cache::SelectionCache;
use super::context::ContextWriter;

// ============================================================================
// HostMode
// ============================================================================

/// Host-side view of the inspector, published to mode subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostMode {
    /// Inspect mode requested by the host.
    pub inspecting: bool,
    /// Multi-select requested by the host.
    pub multi_select: bool,
    /// Whether a client is attached.
    pub connected: bool,
}

// ============================================================================
// HostEvent
// ============================================================================

/// Event returned by [`HostSession::next_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A client socket attached.
    Connected,
    /// The client announced `ready`; the cache was reset and intent re-sent.
    ClientReady,
    /// The staged snapshot changed.
    SnapshotChanged(Vec<StagedElementWire>),
    /// The client locked an element.
    ElementSelected(Measurement),
    /// The locked element was re-measured.
    Measurement(Measurement),
    /// The client reported an error.
    ClientError(String),
    /// The client went away.
    Disconnected {
        /// `false` for network failures and stale heartbeats.
        clean: bool,
    },
    /// Transport-level error (malformed frame, socket error).
    TransportError(String),
}

// ============================================================================
// HostSession
// ============================================================================

/// Host half of the inspector link.
///
/// Build one with [`crate::host::HostBuilder`].
pub struct HostSession {
    id: SessionId,
    transport: HostTransport,
    events: EventReceiver<ClientMessage>,
    cache: SelectionCache,
    mode: HostMode,
    context: Option<ContextWriter>,
    mode_subscribers: Subscribers<HostMode>,
    client_options: ClientOptions,
}

// ============================================================================
// HostSession - Constructor
// ============================================================================

impl HostSession {
    pub(super) fn new(
        transport: HostTransport,
        events: EventReceiver<ClientMessage>,
        context: Option<ContextWriter>,
        client_options: ClientOptions,
    ) -> Self {
        let id = SessionId::generate();
        info!(session_id = %id, port = transport.port(), "Host session started");

        Self {
            id,
            transport,
            events,
            cache: SelectionCache::new(),
            mode: HostMode::default(),
            context,
            mode_subscribers: Subscribers::new(),
            client_options,
        }
    }
}

// ============================================================================
// HostSession - Accessors
// ============================================================================

impl HostSession {
    /// Session id, embedded in the bootstrap.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Bound port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.transport.port()
    }

    /// Bound address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// URL the client dials.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        self.transport.ws_url()
    }

    /// Last known staged snapshot.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &[StagedElementWire] {
        self.cache.snapshot()
    }

    /// Latest locked selection.
    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<&Measurement> {
        self.cache.selected()
    }

    /// 1-based display number of a staged entry.
    #[inline]
    #[must_use]
    pub fn display_number(&self, id: &StagedId) -> Option<usize> {
        self.cache.display_number(id)
    }

    /// Current mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> HostMode {
        self.mode
    }

    /// Context file writer, if configured.
    #[inline]
    #[must_use]
    pub fn context(&self) -> Option<&ContextWriter> {
        self.context.as_ref()
    }

    /// Script the browser launcher injects into the page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the client options fail to serialize.
    pub fn injection_script(&self) -> Result<String> {
        bootstrap::build_injection_script(&self.ws_url(), &self.id, &self.client_options)
    }
}

// ============================================================================
// HostSession - Commands
// ============================================================================

impl HostSession {
    /// Turns inspect mode on or off. Returns `false` if no client received it.
    ///
    /// The intent is kept and re-sent to every client that becomes ready.
    pub fn set_inspect_mode(&mut self, enabled: bool) -> bool {
        if self.mode.inspecting != enabled {
            self.mode.inspecting = enabled;
            self.notify_mode();
        }
        self.transport.send(&HostMessage::SetInspectMode { enabled })
    }

    /// Turns multi-select on or off. Returns `false` if no client received it.
    pub fn set_multi_select(&mut self, enabled: bool) -> bool {
        if self.mode.multi_select != enabled {
            self.mode.multi_select = enabled;
            self.notify_mode();
        }
        self.transport.send(&HostMessage::SetMultiSelect { enabled })
    }

    /// Asks the client to highlight the element matching `selector`.
    pub fn highlight_element(&self, selector: impl Into<String>) -> bool {
        self.transport.send(&HostMessage::HighlightElement {
            selector: selector.into(),
        })
    }

    /// Removes highlight and staged emphasis.
    pub fn clear_highlight(&self) -> bool {
        self.transport.send(&HostMessage::ClearHighlight)
    }

    /// Asks the client to empty its staging table.
    ///
    /// The cache is untouched until the client acknowledges with
    /// `selections-cleared`.
    pub fn clear_staged(&self) -> bool {
        self.transport.send(&HostMessage::ClearStaged)
    }

    /// Emphasizes a subset of staged entries.
    pub fn highlight_staged(&self, ids: Vec<StagedId>) -> bool {
        self.transport.send(&HostMessage::HighlightStaged { ids })
    }

    /// Subscribes to snapshot changes.
    pub fn on_snapshot(
        &mut self,
        handler: impl Fn(&[StagedElementWire]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.cache.subscribe(handler)
    }

    /// Subscribes to mode changes.
    pub fn on_mode(&mut self, handler: impl Fn(&HostMode) + Send + Sync + 'static) -> SubscriptionId {
        self.mode_subscribers.subscribe(handler)
    }

    /// Removes a snapshot or mode subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.cache.unsubscribe(id) || self.mode_subscribers.unsubscribe(id)
    }

    /// Stops accepting and closes the live client.
    pub fn shutdown(&mut self) {
        self.transport.shutdown();
        if self.mode.connected {
            self.mode.connected = false;
            self.notify_mode();
        }
    }
}

// ============================================================================
// HostSession - Event Loop
// ============================================================================

impl HostSession {
    /// Waits for the next event worth surfacing.
    ///
    /// Heartbeat replies and no-op updates are consumed internally. Returns
    /// `None` once the transport has shut down.
    pub async fn next_event(&mut self) -> Option<HostEvent> {
        loop {
            let event = self.events.recv().await?;
            if let Some(event) = self.handle_transport_event(event) {
                return Some(event);
            }
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent<ClientMessage>) -> Option<HostEvent> {
        match event {
            TransportEvent::Connected => {
                self.set_connected(true);
                Some(HostEvent::Connected)
            }
            TransportEvent::Disconnected { clean } => {
                self.set_connected(false);
                Some(HostEvent::Disconnected { clean })
            }
            TransportEvent::Message(message) => self.handle_client_message(message),
            TransportEvent::Error(message) => Some(HostEvent::TransportError(message)),
            TransportEvent::MaxRetries => {
                trace!("Ignoring max-retries on host transport");
                None
            }
        }
    }

    fn handle_client_message(&mut self, message: ClientMessage) -> Option<HostEvent> {
        match &message {
            ClientMessage::Ready => {
                debug!(session_id = %self.id, "Client ready, resynchronizing");
                if self.cache.reset() {
                    self.write_context();
                }
                self.resend_intent();
                Some(HostEvent::ClientReady)
            }

            ClientMessage::HeartbeatReply => None,

            ClientMessage::Error { payload } => {
                warn!(message = %payload.message, "Client reported error");
                Some(HostEvent::ClientError(payload.message.clone()))
            }

            ClientMessage::ElementSelected { payload } => {
                self.cache.apply(&message);
                Some(HostEvent::ElementSelected(payload.clone()))
            }

            ClientMessage::Measurement { payload } => {
                self.cache.apply(&message);
                Some(HostEvent::Measurement(payload.clone()))
            }

            ClientMessage::ElementStaged { .. }
            | ClientMessage::ElementUnstaged { .. }
            | ClientMessage::SelectionsCleared => {
                if !self.cache.apply(&message) {
                    return None;
                }
                self.write_context();
                Some(HostEvent::SnapshotChanged(self.cache.snapshot().to_vec()))
            }
        }
    }

    fn resend_intent(&self) {
        if self.mode.inspecting {
            self.transport.send(&HostMessage::SetInspectMode { enabled: true });
        }
        if self.mode.multi_select {
            self.transport.send(&HostMessage::SetMultiSelect { enabled: true });
        }
    }

    fn set_connected(&mut self, connected: bool) {
        if self.mode.connected != connected {
            self.mode.connected = connected;
            self.notify_mode();
        }
    }

    fn write_context(&self) {
        let Some(context) = &self.context else {
            return;
        };
        if let Err(e) = context.write(self.cache.snapshot()) {
            warn!(path = %context.path().display(), error = %e, "Failed to write context file");
        }
    }

    fn notify_mode(&self) {
        self.mode_subscribers.notify(&self.mode);
    }
}

// ============================================================================
// Tests
// ============================================================================
