//! Client event loop.
//!
//! One task owns the [`ClientSession`] and processes, one at a time:
//!
//! - transport events (open, close, host messages, errors, exhaustion)
//! - page events, dropped unless their listener is attached
//! - debounced hover ticks
//! - coalesced frame ticks
//!
//! After every event the session outbox is flushed to the transport;
//! anything sent while the channel is down is dropped.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::event::{PageEvent, PageEventSender};
use super::session::ClientSession;
use crate::config::ClientOptions;
use crate::dom::{EventGate, Overlay, PageDom};
use crate::error::Result;
use crate::inspect::{
    FRAME_INTERVAL, FrameCoalescer, FrameTick, HoverDebouncer, HoverTick, InspectionMode,
};
use crate::protocol::{HostMessage, WireMessage};
use crate::transport::{ClientTransport, Connector, EventReceiver, TransportEvent, WsConnector};

// ============================================================================
// ClientRuntime
// ============================================================================

/// Drives a [`ClientSession`] from its transport and page.
///
/// # Example
///
/// ```ignore
/// let (runtime, page) = ClientRuntime::new(ws_url, ClientOptions::default(), dom, overlay)?;
/// tokio::spawn(runtime.run());
///
/// page.send(PageEvent::Click { point })?;
/// ```
pub struct ClientRuntime<D: PageDom, O: Overlay> {
    session: ClientSession<D, O, EventGate>,
    gate: EventGate,
    transport: ClientTransport,
    transport_rx: EventReceiver<HostMessage>,
    page_rx: mpsc::UnboundedReceiver<PageEvent>,
    hover: HoverDebouncer,
    hover_rx: mpsc::UnboundedReceiver<HoverTick>,
    frames: FrameCoalescer,
    frame_rx: mpsc::UnboundedReceiver<FrameTick>,
}

impl<D: PageDom, O: Overlay> ClientRuntime<D, O> {
    /// Creates a runtime dialing `url`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] or [`crate::Error::Url`] for invalid
    /// options or URL.
    pub fn new(
        url: &str,
        options: ClientOptions,
        dom: D,
        overlay: O,
    ) -> Result<(Self, PageEventSender)> {
        Self::with_connector(url, options, dom, overlay, WsConnector::default())
    }

    /// Creates a runtime with a custom connector.
    ///
    /// # Errors
    ///
    /// Same as [`ClientRuntime::new`].
    pub fn with_connector(
        url: &str,
        options: ClientOptions,
        dom: D,
        overlay: O,
        connector: impl Connector,
    ) -> Result<(Self, PageEventSender)> {
        let gate = EventGate::new();
        let session = ClientSession::new(&options, dom, overlay, gate.clone())?;
        let (transport, transport_rx) =
            ClientTransport::with_connector(url, options.reconnect.clone(), connector)?;

        let (page_tx, page_rx) = mpsc::unbounded_channel();
        let (hover, hover_rx) = HoverDebouncer::new(options.hover_debounce);
        let (frames, frame_rx) = FrameCoalescer::new(FRAME_INTERVAL);

        Ok((
            Self {
                session,
                gate,
                transport,
                transport_rx,
                page_rx,
                hover,
                hover_rx,
                frames,
                frame_rx,
            },
            page_tx,
        ))
    }

    /// Session state.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &ClientSession<D, O, EventGate> {
        &self.session
    }

    /// Session state, for subscriptions before [`run`](Self::run).
    #[inline]
    pub fn session_mut(&mut self) -> &mut ClientSession<D, O, EventGate> {
        &mut self.session
    }

    /// Listener gate.
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &EventGate {
        &self.gate
    }

    /// Connects and processes events until every page sender is dropped.
    ///
    /// A failed first connection is logged; the transport keeps retrying
    /// and the loop keeps running.
    pub async fn run(mut self) {
        if let Err(e) = self.transport.connect().await {
            warn!(url = %self.transport.url(), error = %e, "Client started without a host");
        } else {
            info!(url = %self.transport.url(), "Client connected");
        }

        loop {
            tokio::select! {
                event = self.transport_rx.recv() => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => break,
                },

                page = self.page_rx.recv() => match page {
                    Some(event) => self.handle_page_event(event),
                    None => {
                        debug!("Page event channel closed");
                        break;
                    }
                },

                Some(tick) = self.hover_rx.recv() => {
                    if self.hover.is_current(&tick) {
                        self.session.on_hover(tick.point);
                    } else {
                        trace!(generation = tick.generation, "Stale hover tick");
                    }
                }

                Some(FrameTick) = self.frame_rx.recv() => {
                    self.frames.complete();
                    self.session.refresh_frame();
                }
            }

            if self.session.mode() != InspectionMode::Picking {
                self.hover.cancel();
            }
            self.flush();
        }

        self.hover.cancel();
        self.transport.disconnect();
        debug!("Client runtime stopped");
    }

    fn handle_transport_event(&mut self, event: TransportEvent<HostMessage>) {
        match event {
            TransportEvent::Connected => self.session.on_connected(),
            TransportEvent::Disconnected { clean } => self.session.on_disconnected(clean),
            TransportEvent::Message(message) => self.session.handle_host_message(message),
            TransportEvent::Error(message) => self.session.on_transport_error(&message),
            TransportEvent::MaxRetries => self.session.on_max_retries(),
        }
    }

    fn handle_page_event(&mut self, event: PageEvent) {
        if let Some(kind) = event.listener()
            && !self.gate.is_attached(kind)
        {
            trace!(?kind, "Listener detached, dropping page event");
            return;
        }

        match event {
            PageEvent::PointerMove(point) => self.hover.schedule(point),
            PageEvent::Viewport => {
                self.frames.request();
            }
            PageEvent::Visibility(visible) => {
                self.transport.notify_visibility(visible);
            }
            other => self.session.handle_page_event(other),
        }
    }

    fn flush(&mut self) {
        for message in self.session.take_outbox() {
            if !self.transport.send(&message) {
                trace!(tag = message.tag(), "Channel closed, message dropped");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
