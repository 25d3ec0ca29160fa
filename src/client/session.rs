//! Synchronous client core.
//!
//! [`ClientSession`] owns the staging table, the inspection machine and the
//! page collaborators. It never touches the socket: every handler queues
//! outbound messages in an outbox that the runtime flushes after each
//! event.
//!
//! # Host Commands
//!
//! | Message | Effect |
//! |---------|--------|
//! | `set-inspect-mode` | show + pick, or hide |
//! | `set-multi-select` | clicks stage instead of lock |
//! | `highlight-element` | highlight by selector, silent if unresolved |
//! | `clear-highlight` | drop highlight and badge emphasis |
//! | `clear-staged` | clear the table, reply `selections-cleared` |
//! | `highlight-staged` | emphasize matching badges |

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace, warn};

use super::event::{Key, PageEvent};
use crate::config::ClientOptions;
use crate::dom::{ListenerRegistry, Overlay, PageDom, Point};
use crate::error::Result;
use crate::identifiers::{ElementHandle, StagedId};
use crate::inspect::{InspectionMachine, InspectionMode, hit_test};
use crate::protocol::{ClientMessage, HostMessage};
use crate::staging::{StagingManager, ToggleOutcome};

// ============================================================================
// Constants
// ============================================================================

/// Notice shown once reconnection gives up.
pub const MAX_RETRIES_NOTICE: &str = "Max retries reached, reload to reconnect";

// ============================================================================
// ClientSession
// ============================================================================

/// One browser client's inspection session.
#[derive(Debug)]
pub struct ClientSession<D: PageDom, O: Overlay, L: ListenerRegistry> {
    dom: D,
    overlay: O,
    machine: InspectionMachine<L>,
    staging: StagingManager,
    multi_select: bool,
    emphasized: Vec<StagedId>,
    connected: bool,
    outbox: Vec<ClientMessage>,
}

// ============================================================================
// ClientSession - Constructor & Accessors
// ============================================================================

impl<D: PageDom, O: Overlay, L: ListenerRegistry> ClientSession<D, O, L> {
    /// Creates a hidden session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the options are invalid.
    pub fn new(options: &ClientOptions, dom: D, overlay: O, listeners: L) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            dom,
            overlay,
            machine: InspectionMachine::with_history_capacity(listeners, options.history_capacity),
            staging: StagingManager::new(options.staging_capacity)?,
            multi_select: false,
            emphasized: Vec::new(),
            connected: false,
            outbox: Vec::new(),
        })
    }

    /// Staging table.
    #[inline]
    #[must_use]
    pub fn staging(&self) -> &StagingManager {
        &self.staging
    }

    /// Staging table, for subscriptions.
    #[inline]
    pub fn staging_mut(&mut self) -> &mut StagingManager {
        &mut self.staging
    }

    /// Inspection machine.
    #[inline]
    #[must_use]
    pub fn machine(&self) -> &InspectionMachine<L> {
        &self.machine
    }

    /// Inspection machine, for subscriptions.
    #[inline]
    pub fn machine_mut(&mut self) -> &mut InspectionMachine<L> {
        &mut self.machine
    }

    /// Current mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> InspectionMode {
        self.machine.mode()
    }

    /// Whether clicks stage elements.
    #[inline]
    #[must_use]
    pub fn multi_select(&self) -> bool {
        self.multi_select
    }

    /// Whether the channel is believed open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Page handle.
    #[inline]
    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Takes the queued outbound messages.
    pub fn take_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }
}

// ============================================================================
// ClientSession - Connection
// ============================================================================

impl<D: PageDom, O: Overlay, L: ListenerRegistry> ClientSession<D, O, L> {
    /// Replays local state after the channel (re)opened.
    ///
    /// The host resets its cache on `ready`, so the full staged snapshot and
    /// the locked selection are sent again.
    pub fn on_connected(&mut self) {
        self.connected = true;

        for wire in self.staging.wire_snapshot() {
            self.outbox.push(ClientMessage::ElementStaged { payload: wire });
        }
        if let Some(selected) = &self.machine.state().selected {
            self.outbox.push(ClientMessage::ElementSelected {
                payload: selected.measurement.clone(),
            });
        }

        debug!(
            staged = self.staging.len(),
            mode = %self.machine.mode(),
            "Client state replayed"
        );
    }

    /// Records a closed channel. Local state is kept.
    pub fn on_disconnected(&mut self, clean: bool) {
        self.connected = false;
        debug!(clean, staged = self.staging.len(), "Channel closed, keeping local state");
    }

    /// Shows the terminal reconnection notice.
    pub fn on_max_retries(&mut self) {
        self.connected = false;
        warn!("Reconnection exhausted");
        self.overlay.show_notice(MAX_RETRIES_NOTICE);
    }

    /// Reports a local transport error to the host.
    pub fn on_transport_error(&mut self, message: &str) {
        debug!(error = %message, "Transport error");
        if self.connected {
            self.outbox.push(ClientMessage::error(message));
        }
    }
}

// ============================================================================
// ClientSession - Host Messages
// ============================================================================

impl<D: PageDom, O: Overlay, L: ListenerRegistry> ClientSession<D, O, L> {
    /// Applies a host command.
    pub fn handle_host_message(&mut self, message: HostMessage) {
        match message {
            HostMessage::Heartbeat => {}

            HostMessage::SetInspectMode { enabled } => self.set_inspect_mode(enabled),

            HostMessage::SetMultiSelect { enabled } => {
                debug!(enabled, "Multi-select changed");
                self.multi_select = enabled;
            }

            HostMessage::HighlightElement { selector } => match self.dom.query(&selector) {
                Some(element) => {
                    let measurement = self.dom.measure(element);
                    self.overlay.highlight(element, measurement.as_ref());
                }
                None => debug!(%selector, "Highlight target not found"),
            },

            HostMessage::ClearHighlight => {
                self.overlay.clear_highlight();
                if !self.emphasized.is_empty() {
                    self.emphasized.clear();
                    self.render_badges();
                }
            }

            HostMessage::ClearStaged => {
                self.staging.clear();
                self.emphasized.clear();
                self.outbox.push(ClientMessage::SelectionsCleared);
                self.render_badges();
            }

            HostMessage::HighlightStaged { ids } => {
                self.emphasized = ids
                    .into_iter()
                    .filter(|id| self.staging.get(id).is_some())
                    .collect();
                self.render_badges();
            }
        }
    }

    /// Enabling is idempotent: a picking or locked client keeps its state,
    /// so the intent the host re-sends on `ready` never drops a lock.
    fn set_inspect_mode(&mut self, enabled: bool) {
        if enabled {
            match self.machine.mode() {
                InspectionMode::Hidden => {
                    if self.machine.show() {
                        self.overlay.show_panel();
                    }
                    self.machine.enter_pick_mode();
                }
                InspectionMode::Observing => {
                    self.machine.enter_pick_mode();
                }
                InspectionMode::Picking | InspectionMode::Locked => {
                    trace!(mode = %self.machine.mode(), "Inspect mode already active");
                }
            }
        } else if self.machine.hide() {
            self.overlay.show_hover(None);
            self.overlay.clear_highlight();
            self.overlay.hide_panel();
        }
    }
}

// ============================================================================
// ClientSession - Page Events
// ============================================================================

impl<D: PageDom, O: Overlay, L: ListenerRegistry> ClientSession<D, O, L> {
    /// Dispatches an undebounced page event.
    ///
    /// Pointer moves and viewport changes are scheduled by the runtime;
    /// they land here only when driven synchronously.
    pub fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::PointerMove(point) => self.on_hover(point),
            PageEvent::Click { point } => self.on_click(point),
            PageEvent::KeyDown(key) => self.on_key(&key),
            PageEvent::Viewport => self.refresh_frame(),
            PageEvent::PanelToggled(open) => self.machine.set_panel_open(open),
            PageEvent::Visibility(_) => {}
        }
    }

    /// Resolves the hover target under `point`.
    pub fn on_hover(&mut self, point: Point) {
        if self.machine.mode() != InspectionMode::Picking {
            return;
        }
        let target = hit_test(&self.dom, &self.overlay.roots(), point);
        if self.machine.set_hovered(target) {
            self.overlay.show_hover(target);
        }
    }

    /// Picks or stages the element under `point`.
    pub fn on_click(&mut self, point: Point) {
        if self.machine.mode() != InspectionMode::Picking {
            return;
        }
        let Some(element) = hit_test(&self.dom, &self.overlay.roots(), point) else {
            trace!(x = point.x, y = point.y, "Click outside any element");
            return;
        };

        if self.multi_select {
            self.toggle_staged(element);
        } else {
            self.lock(element);
        }
    }

    /// Escape leaves the innermost mode.
    pub fn on_key(&mut self, key: &Key) {
        if *key != Key::Escape {
            return;
        }
        match self.machine.mode() {
            InspectionMode::Locked => {
                if self.machine.deselect_element() {
                    self.overlay.clear_highlight();
                    if self.machine.mode() == InspectionMode::Hidden {
                        self.overlay.hide_panel();
                    }
                }
            }
            InspectionMode::Picking => {
                if self.machine.exit_pick_mode() {
                    self.overlay.show_hover(None);
                }
            }
            InspectionMode::Observing | InspectionMode::Hidden => {}
        }
    }

    /// Re-measures after scroll or resize and reconciles staged entries.
    pub fn refresh_frame(&mut self) {
        self.refresh_selection();

        let reconciled = self.staging.reconcile(&self.dom);
        for entry in &reconciled.dropped {
            self.emphasized.retain(|id| id != entry.id());
            self.outbox.push(ClientMessage::unstaged(entry.id().clone()));
        }

        self.overlay.refresh_positions();
        if reconciled.changed() {
            self.render_badges();
        }
    }

    fn refresh_selection(&mut self) {
        let Some(selected) = self.machine.state().selected.clone() else {
            return;
        };

        let element = if self.dom.is_connected(selected.element) {
            Some(selected.element)
        } else {
            self.dom.query(&selected.measurement.selector)
        };

        match element.and_then(|el| self.dom.measure(el).map(|m| (el, m))) {
            Some((element, measurement)) => {
                if element != selected.element {
                    debug!(from = %selected.element, to = %element, "Locked element relocated");
                    self.machine.select_element(element, measurement.clone());
                } else if !self.machine.update_measurement(measurement.clone()) {
                    return;
                }
                self.overlay.highlight(element, Some(&measurement));
                self.outbox.push(ClientMessage::Measurement {
                    payload: measurement,
                });
            }
            None => {
                debug!(element = %selected.element, "Locked element lost");
                self.machine.deselect_element();
                self.overlay.clear_highlight();
            }
        }
    }
}

// ============================================================================
// ClientSession - Selection
// ============================================================================

impl<D: PageDom, O: Overlay, L: ListenerRegistry> ClientSession<D, O, L> {
    fn lock(&mut self, element: ElementHandle) {
        let Some(measurement) = self.dom.measure(element) else {
            self.outbox
                .push(ClientMessage::error(format!("cannot measure {element}")));
            return;
        };

        if self.machine.select_element(element, measurement.clone()) {
            self.overlay.show_hover(None);
            self.overlay.highlight(element, Some(&measurement));
            self.outbox.push(ClientMessage::ElementSelected {
                payload: measurement,
            });
        }
    }

    fn toggle_staged(&mut self, element: ElementHandle) {
        match self.staging.toggle(&self.dom, element) {
            Some(ToggleOutcome::Added(added)) => {
                if let Some(evicted) = added.evicted {
                    self.emphasized.retain(|id| id != evicted.id());
                    self.outbox.push(ClientMessage::unstaged(evicted.id().clone()));
                }
                if let Some(entry) = self.staging.get(&added.id) {
                    self.outbox.push(ClientMessage::ElementStaged {
                        payload: entry.to_wire(),
                    });
                }
            }
            Some(ToggleOutcome::Removed(entry)) => {
                self.emphasized.retain(|id| id != entry.id());
                self.outbox.push(ClientMessage::unstaged(entry.id().clone()));
            }
            None => {
                debug!(%element, "Element cannot be staged");
                return;
            }
        }
        self.render_badges();
    }

    fn render_badges(&mut self) {
        let badges = self.staging.badges(&self.emphasized);
        self.overlay.render_badges(&badges);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dom::{ElementInfo, EventGate, ListenerKind, MemoryDom, OverlayCall, RecordingOverlay};
    use crate::protocol::{Rect, StagedElementWire};

    type Session = ClientSession<MemoryDom, RecordingOverlay, EventGate>;

    struct Page {
        dom: MemoryDom,
        overlay: RecordingOverlay,
        gate: EventGate,
        cards: Vec<ElementHandle>,
        panel: ElementHandle,
    }

    /// Body with three side-by-side cards and an overlay panel on top.
    fn page() -> Page {
        let dom = MemoryDom::new();
        let body = dom.insert_with_rect(None, ElementInfo::new("body"), Rect::new(0.0, 0.0, 1000.0, 1000.0));
        let cards = (0..3)
            .map(|i| {
                dom.insert_with_rect(
                    Some(body),
                    ElementInfo::new("div").with_id(format!("card-{i}")),
                    Rect::new(i as f64 * 100.0, 0.0, 100.0, 100.0),
                )
            })
            .collect();
        let panel = dom.insert_with_rect(
            Some(body),
            ElementInfo::new("aside").with_id("inspector"),
            Rect::new(0.0, 900.0, 1000.0, 100.0),
        );
        Page {
            overlay: RecordingOverlay::with_roots(vec![panel]),
            gate: EventGate::new(),
            dom,
            cards,
            panel,
        }
    }

    fn session(page: &Page, options: ClientOptions) -> Session {
        ClientSession::new(&options, page.dom.clone(), page.overlay.clone(), page.gate.clone())
            .expect("valid options")
    }

    fn card_point(i: usize) -> Point {
        Point::new(i as f64 * 100.0 + 50.0, 50.0)
    }

    fn staged_ids(messages: &[ClientMessage]) -> Vec<StagedElementWire> {
        messages
            .iter()
            .filter_map(|m| match m {
                ClientMessage::ElementStaged { payload } => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    fn picking_session(page: &Page) -> Session {
        let mut session = session(page, ClientOptions::default());
        session.on_connected();
        session.handle_host_message(HostMessage::SetInspectMode { enabled: true });
        session.take_outbox();
        session
    }

    fn staging_session(page: &Page) -> Session {
        let mut session = picking_session(page);
        session.handle_host_message(HostMessage::SetMultiSelect { enabled: true });
        session
    }

    #[test]
    fn test_invalid_options_rejected() {
        let page = page();
        let result = ClientSession::new(
            &ClientOptions::default().with_staging_capacity(0),
            page.dom.clone(),
            page.overlay.clone(),
            page.gate.clone(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_mode_toggles_listeners_and_panel() {
        let page = page();
        let mut session = picking_session(&page);

        assert_eq!(session.mode(), InspectionMode::Picking);
        assert!(page.gate.is_attached(ListenerKind::PointerMove));
        assert!(page.overlay.calls().contains(&OverlayCall::ShowPanel));

        session.handle_host_message(HostMessage::SetInspectMode { enabled: false });
        assert_eq!(session.mode(), InspectionMode::Hidden);
        assert!(page.gate.attached().is_empty());
        assert_eq!(page.overlay.calls().last(), Some(&OverlayCall::HidePanel));
    }

    #[test]
    fn test_click_locks_and_reports_selection() {
        let page = page();
        let mut session = picking_session(&page);

        session.on_click(card_point(1));

        assert_eq!(session.mode(), InspectionMode::Locked);
        let outbox = session.take_outbox();
        assert!(matches!(
            outbox.as_slice(),
            [ClientMessage::ElementSelected { payload }] if payload.selector == "#card-1"
        ));
        assert!(page.overlay.calls().contains(&OverlayCall::Highlight(page.cards[1])));
        assert!(!page.gate.is_attached(ListenerKind::Click));
    }

    #[test]
    fn test_hover_masks_overlay_panel() {
        let page = page();
        let mut session = picking_session(&page);

        session.on_hover(Point::new(50.0, 950.0));
        assert!(session.machine().state().hovered.is_some());
        assert_ne!(session.machine().state().hovered, Some(page.panel));

        session.on_hover(card_point(0));
        assert_eq!(session.machine().state().hovered, Some(page.cards[0]));
        assert_eq!(page.overlay.calls().last(), Some(&OverlayCall::Hover(Some(page.cards[0]))));
    }

    #[test]
    fn test_multi_select_stages_with_badges() {
        let page = page();
        let mut session = picking_session(&page);
        session.handle_host_message(HostMessage::SetMultiSelect { enabled: true });

        for i in 0..3 {
            session.on_click(card_point(i));
        }
        let staged = staged_ids(&session.take_outbox());
        assert_eq!(staged.len(), 3);
        assert_eq!(session.mode(), InspectionMode::Picking);

        // Unstage B by clicking it again.
        session.on_click(card_point(1));
        assert_eq!(
            session.take_outbox(),
            vec![ClientMessage::unstaged(staged[1].id.clone())]
        );

        let badges = page.overlay.badges();
        let numbered: Vec<_> = badges.iter().map(|b| (b.element, b.number)).collect();
        assert_eq!(numbered, vec![(page.cards[0], 1), (page.cards[2], 2)]);
    }

    #[test]
    fn test_click_without_multi_select_never_stages() {
        let page = page();
        let mut session = picking_session(&page);
        assert!(!session.multi_select());

        session.on_click(card_point(0));

        assert!(session.staging().is_empty());
        assert_eq!(session.mode(), InspectionMode::Locked);
        assert!(matches!(
            session.take_outbox().as_slice(),
            [ClientMessage::ElementSelected { .. }]
        ));
    }

    #[test]
    fn test_resync_keeps_locked_selection() {
        let page = page();
        let mut session = picking_session(&page);
        session.on_click(card_point(1));
        session.take_outbox();

        session.on_disconnected(false);
        session.on_connected();
        assert!(matches!(
            session.take_outbox().as_slice(),
            [ClientMessage::ElementSelected { .. }]
        ));

        // The host re-sends its intent after `ready`.
        session.handle_host_message(HostMessage::SetInspectMode { enabled: true });

        assert_eq!(session.mode(), InspectionMode::Locked);
        assert_eq!(
            session.machine().state().selected.as_ref().map(|s| s.element),
            Some(page.cards[1])
        );
        assert!(session.machine().history().is_empty());
        assert!(!page.gate.is_attached(ListenerKind::PointerMove));
    }

    #[test]
    fn test_repeated_inspect_mode_keeps_picking_state() {
        let page = page();
        let mut session = picking_session(&page);
        session.on_hover(card_point(2));

        session.handle_host_message(HostMessage::SetInspectMode { enabled: true });

        assert_eq!(session.mode(), InspectionMode::Picking);
        assert_eq!(session.machine().state().hovered, Some(page.cards[2]));
    }

    #[test]
    fn test_eviction_sends_unstaged_before_staged() {
        let page = page();
        let mut session = session(&page, ClientOptions::default().with_staging_capacity(2));
        session.on_connected();
        session.handle_host_message(HostMessage::SetInspectMode { enabled: true });
        session.handle_host_message(HostMessage::SetMultiSelect { enabled: true });

        session.on_click(card_point(0));
        session.on_click(card_point(1));
        let first = staged_ids(&session.take_outbox());
        session.on_click(card_point(2));

        let outbox = session.take_outbox();
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[0], ClientMessage::unstaged(first[0].id.clone()));
        assert!(matches!(&outbox[1], ClientMessage::ElementStaged { .. }));
    }

    #[test]
    fn test_clear_staged_replies_once() {
        let page = page();
        let mut session = staging_session(&page);
        session.on_click(card_point(0));
        session.on_click(card_point(1));
        session.take_outbox();

        session.handle_host_message(HostMessage::ClearStaged);

        assert!(session.staging().is_empty());
        assert_eq!(session.take_outbox(), vec![ClientMessage::SelectionsCleared]);
        assert!(page.overlay.badges().is_empty());
    }

    #[test]
    fn test_highlight_staged_emphasizes_known_ids() {
        let page = page();
        let mut session = staging_session(&page);
        session.on_click(card_point(0));
        session.on_click(card_point(1));
        let staged = staged_ids(&session.take_outbox());

        session.handle_host_message(HostMessage::HighlightStaged {
            ids: vec![staged[1].id.clone(), StagedId::from_wire("gone-1")],
        });

        let emphasized: Vec<_> = page.overlay.badges().iter().map(|b| b.emphasized).collect();
        assert_eq!(emphasized, vec![false, true]);

        session.handle_host_message(HostMessage::ClearHighlight);
        assert!(page.overlay.badges().iter().all(|b| !b.emphasized));
    }

    #[test]
    fn test_highlight_unknown_selector_is_silent() {
        let page = page();
        let mut session = picking_session(&page);
        page.overlay.clear_calls();

        session.handle_host_message(HostMessage::HighlightElement {
            selector: "#missing".to_string(),
        });
        assert!(page.overlay.calls().is_empty());

        session.handle_host_message(HostMessage::HighlightElement {
            selector: "#inspector".to_string(),
        });
        assert_eq!(page.overlay.calls(), vec![OverlayCall::Highlight(page.panel)]);
        assert!(session.take_outbox().is_empty());
    }

    #[test]
    fn test_escape_unwinds_modes() {
        let page = page();
        let mut session = picking_session(&page);
        session.on_click(card_point(0));

        session.on_key(&Key::Escape);
        assert_eq!(session.mode(), InspectionMode::Observing);

        session.handle_host_message(HostMessage::SetInspectMode { enabled: true });
        session.on_key(&Key::Other("a".into()));
        assert_eq!(session.mode(), InspectionMode::Picking);
        session.on_key(&Key::Escape);
        assert_eq!(session.mode(), InspectionMode::Observing);
    }

    #[test]
    fn test_reconnect_replays_snapshot_and_keeps_table() {
        let page = page();
        let mut session = staging_session(&page);
        session.on_click(card_point(0));
        session.on_click(card_point(2));
        let before = staged_ids(&session.take_outbox());

        session.on_disconnected(true);
        session.on_connected();

        assert_eq!(session.staging().len(), 2);
        assert_eq!(staged_ids(&session.take_outbox()), before);
    }

    #[test]
    fn test_replay_includes_locked_selection() {
        let page = page();
        let mut session = picking_session(&page);
        session.on_click(card_point(1));
        session.take_outbox();

        session.on_disconnected(false);
        session.on_connected();

        assert!(matches!(
            session.take_outbox().as_slice(),
            [ClientMessage::ElementSelected { .. }]
        ));
    }

    #[test]
    fn test_frame_refresh_remeasures_and_reconciles() {
        let page = page();
        let mut session = staging_session(&page);
        session.on_click(card_point(0));
        session.on_click(card_point(1));
        let staged = staged_ids(&session.take_outbox());
        session.handle_host_message(HostMessage::SetMultiSelect { enabled: false });
        session.on_click(card_point(2));
        session.take_outbox();

        // Locked card moves; first staged card is re-rendered; second vanishes.
        page.dom.set_rect(page.cards[2], Rect::new(200.0, 10.0, 100.0, 100.0));
        page.dom.replace(page.cards[0]);
        page.dom.remove(page.cards[1]);

        session.refresh_frame();

        let outbox = session.take_outbox();
        assert!(outbox.iter().any(|m| matches!(
            m,
            ClientMessage::Measurement { payload } if payload.rect.y == 10.0
        )));
        assert!(outbox.contains(&ClientMessage::unstaged(staged[1].id.clone())));
        assert_eq!(session.staging().len(), 1);
        assert_eq!(session.staging().snapshot()[0].id(), &staged[0].id);
        assert!(page.overlay.calls().contains(&OverlayCall::Refresh));
    }

    #[test]
    fn test_lost_locked_element_deselects() {
        let page = page();
        let mut session = picking_session(&page);
        session.on_click(card_point(0));
        session.take_outbox();

        page.dom.remove(page.cards[0]);
        page.dom.remove(page.cards[1]);
        page.dom.remove(page.cards[2]);
        session.refresh_frame();

        assert_eq!(session.mode(), InspectionMode::Observing);
        assert!(session.take_outbox().is_empty());
    }

    #[test]
    fn test_max_retries_shows_notice() {
        let page = page();
        let mut session = picking_session(&page);

        session.on_max_retries();

        assert_eq!(page.overlay.last_notice().as_deref(), Some(MAX_RETRIES_NOTICE));
        assert!(!session.is_connected());
    }
}
