//! Inspection state machine.
//!
//! ```text
//!            show()              enter_pick_mode()
//!   Hidden ─────────► Observing ─────────────────► Picking
//!     ▲                  ▲  ◄──────────────────────  │
//!     │                  │      exit_pick_mode()     │ select_element()
//!     │ hide()           │ deselect_element()        ▼
//!     └──── (any) ───────┴──────────────────────── Locked ◄─┐
//!                                                    │      │ select_element()
//!                                                    └──────┘
//! ```
//!
//! Invalid transitions return `false` and change nothing. Listener
//! attachment is owned by the transition itself: leaving a mode detaches
//! that mode's listeners, entering one attaches its own.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::state::{InspectionMode, InspectionState, SelectedElement};
use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::dom::ListenerRegistry;
use crate::identifiers::{ElementHandle, SubscriptionId};
use crate::protocol::Measurement;
use crate::subscribers::Subscribers;

// ============================================================================
// InspectionMachine
// ============================================================================

/// Owns the inspection state and the listeners it implies.
#[derive(Debug)]
pub struct InspectionMachine<L: ListenerRegistry> {
    state: InspectionState,
    history: VecDeque<SelectedElement>,
    history_capacity: usize,
    panel_open: bool,
    listeners: L,
    subscribers: Subscribers<InspectionState>,
}

impl<L: ListenerRegistry> InspectionMachine<L> {
    /// Creates a hidden machine with the default history capacity.
    #[must_use]
    pub fn new(listeners: L) -> Self {
        Self::with_history_capacity(listeners, DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a hidden machine.
    #[must_use]
    pub fn with_history_capacity(listeners: L, history_capacity: usize) -> Self {
        Self {
            state: InspectionState::default(),
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            panel_open: false,
            listeners,
            subscribers: Subscribers::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &InspectionState {
        &self.state
    }

    /// Current mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> InspectionMode {
        self.state.mode
    }

    /// Released selections, oldest first.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &VecDeque<SelectedElement> {
        &self.history
    }

    /// Whether the panel is expanded.
    #[inline]
    #[must_use]
    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    /// Listener registry.
    #[inline]
    #[must_use]
    pub fn listeners(&self) -> &L {
        &self.listeners
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// `Hidden → Observing`.
    pub fn show(&mut self) -> bool {
        if self.state.mode != InspectionMode::Hidden {
            return self.rejected("show");
        }
        self.panel_open = true;
        self.transition(InspectionMode::Observing);
        true
    }

    /// Any visible mode → `Hidden`.
    pub fn hide(&mut self) -> bool {
        if self.state.mode == InspectionMode::Hidden {
            return self.rejected("hide");
        }
        self.panel_open = false;
        self.transition(InspectionMode::Hidden);
        true
    }

    /// `Observing | Locked → Picking`.
    pub fn enter_pick_mode(&mut self) -> bool {
        if !matches!(
            self.state.mode,
            InspectionMode::Observing | InspectionMode::Locked
        ) {
            return self.rejected("enter_pick_mode");
        }
        self.transition(InspectionMode::Picking);
        true
    }

    /// `Picking → Observing`.
    pub fn exit_pick_mode(&mut self) -> bool {
        if self.state.mode != InspectionMode::Picking {
            return self.rejected("exit_pick_mode");
        }
        self.transition(InspectionMode::Observing);
        true
    }

    /// `Picking | Locked → Locked`, pinning `element`.
    pub fn select_element(&mut self, element: ElementHandle, measurement: Measurement) -> bool {
        if !matches!(
            self.state.mode,
            InspectionMode::Picking | InspectionMode::Locked
        ) {
            return self.rejected("select_element");
        }

        if self.state.mode == InspectionMode::Locked {
            // Replacing the pinned element keeps listeners as they are.
            self.release_selection();
            self.state.selected = Some(SelectedElement {
                element,
                measurement,
            });
            debug!(%element, "Selection replaced");
            self.notify();
            return true;
        }

        debug!(%element, "Element locked");
        self.transition_to(
            InspectionMode::Locked,
            Some(SelectedElement {
                element,
                measurement,
            }),
        );
        true
    }

    /// `Locked → Observing` if the panel is open, else `Locked → Hidden`.
    pub fn deselect_element(&mut self) -> bool {
        if self.state.mode != InspectionMode::Locked {
            return self.rejected("deselect_element");
        }
        let next = if self.panel_open {
            InspectionMode::Observing
        } else {
            InspectionMode::Hidden
        };
        self.transition(next);
        true
    }

    // ------------------------------------------------------------------------
    // In-mode updates
    // ------------------------------------------------------------------------

    /// Updates the hover target. Only valid while picking.
    pub fn set_hovered(&mut self, element: Option<ElementHandle>) -> bool {
        if self.state.mode != InspectionMode::Picking || self.state.hovered == element {
            return false;
        }
        self.state.hovered = element;
        self.notify();
        true
    }

    /// Replaces the locked element's measurement.
    pub fn update_measurement(&mut self, measurement: Measurement) -> bool {
        let Some(selected) = self.state.selected.as_mut() else {
            return false;
        };
        if selected.measurement == measurement {
            return false;
        }
        selected.measurement = measurement;
        self.notify();
        true
    }

    /// Records whether the user has the panel expanded.
    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Registers a state handler, called after every applied change.
    pub fn subscribe(
        &mut self,
        handler: impl Fn(&InspectionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    /// Removes a state handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn transition(&mut self, next: InspectionMode) {
        self.transition_to(next, None);
    }

    fn transition_to(&mut self, next: InspectionMode, selected: Option<SelectedElement>) {
        let previous = self.state.mode;
        self.exit(previous);
        self.state.mode = next;
        self.state.selected = selected;
        self.enter(next);

        debug!(from = %previous, to = %next, "Inspection mode changed");
        self.notify();
    }

    fn exit(&mut self, mode: InspectionMode) {
        for kind in mode.listeners() {
            self.listeners.detach(*kind);
        }
        self.state.hovered = None;
        if mode == InspectionMode::Locked {
            self.release_selection();
        }
    }

    fn enter(&mut self, mode: InspectionMode) {
        for kind in mode.listeners() {
            self.listeners.attach(*kind);
        }
    }

    fn release_selection(&mut self) {
        let Some(selected) = self.state.selected.take() else {
            return;
        };
        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(selected);
    }

    fn rejected(&self, transition: &'static str) -> bool {
        trace!(transition, mode = %self.state.mode, "Transition ignored");
        false
    }

    fn notify(&self) {
        self.subscribers.notify(&self.state);
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

    use crate::dom::{EventGate, ListenerKind};

    fn machine() -> (InspectionMachine<EventGate>, EventGate) {
        let gate = EventGate::new();
        (InspectionMachine::new(gate.clone()), gate)
    }

    fn measurement(tag: &str) -> Measurement {
        Measurement {
            tag: tag.to_string(),
            ..Measurement::default()
        }
    }

    #[test]
    fn test_full_cycle() {
        let (mut machine, gate) = machine();
        let el = ElementHandle::new(1);

        assert!(machine.show());
        assert_eq!(gate.attached(), vec![ListenerKind::Viewport]);

        assert!(machine.enter_pick_mode());
        assert_eq!(gate.attached(), ListenerKind::ALL.to_vec());
        assert!(machine.set_hovered(Some(el)));
        assert_eq!(machine.state().hovered, Some(el));

        assert!(machine.select_element(el, measurement("div")));
        assert_eq!(machine.mode(), InspectionMode::Locked);
        assert_eq!(machine.state().hovered, None);
        assert_eq!(
            gate.attached(),
            vec![ListenerKind::KeyDown, ListenerKind::Viewport]
        );

        assert!(machine.deselect_element());
        assert_eq!(machine.mode(), InspectionMode::Observing);
        assert!(machine.state().selected.is_none());
        assert_eq!(machine.history().len(), 1);

        assert!(machine.hide());
        assert!(gate.attached().is_empty());
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let (mut machine, gate) = machine();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        machine.subscribe(move |_| *sink.lock() += 1);

        assert!(!machine.hide());
        assert!(!machine.enter_pick_mode());
        assert!(!machine.exit_pick_mode());
        assert!(!machine.deselect_element());
        assert!(!machine.select_element(ElementHandle::new(1), measurement("a")));
        assert!(!machine.set_hovered(Some(ElementHandle::new(1))));

        assert_eq!(machine.mode(), InspectionMode::Hidden);
        assert!(gate.attached().is_empty());
        assert_eq!(*seen.lock(), 0);
    }

    #[test]
    fn test_deselect_with_closed_panel_hides() {
        let (mut machine, gate) = machine();
        machine.show();
        machine.enter_pick_mode();
        machine.select_element(ElementHandle::new(1), measurement("p"));
        machine.set_panel_open(false);

        assert!(machine.deselect_element());
        assert_eq!(machine.mode(), InspectionMode::Hidden);
        assert!(gate.attached().is_empty());
    }

    #[test]
    fn test_history_is_bounded_and_each_release_recorded_once() {
        let gate = EventGate::new();
        let mut machine = InspectionMachine::with_history_capacity(gate, 3);
        machine.show();
        machine.enter_pick_mode();

        for i in 1..=5 {
            machine.select_element(ElementHandle::new(i), measurement("li"));
        }
        // Four replaced selections, capacity three.
        let kept: Vec<_> = machine.history().iter().map(|s| s.element.as_u64()).collect();
        assert_eq!(kept, vec![2, 3, 4]);

        machine.enter_pick_mode();
        let kept: Vec<_> = machine.history().iter().map(|s| s.element.as_u64()).collect();
        assert_eq!(kept, vec![3, 4, 5]);

        machine.hide();
        assert_eq!(machine.history().len(), 3);
    }

    #[test]
    fn test_update_measurement_only_when_locked() {
        let (mut machine, _gate) = machine();
        assert!(!machine.update_measurement(measurement("x")));

        machine.show();
        machine.enter_pick_mode();
        machine.select_element(ElementHandle::new(1), measurement("x"));

        assert!(!machine.update_measurement(measurement("x")));
        assert!(machine.update_measurement(measurement("y")));
        assert_eq!(
            machine.state().selected.as_ref().map(|s| s.measurement.tag.as_str()),
            Some("y")
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Show,
            Hide,
            EnterPick,
            ExitPick,
            Select(u64),
            Deselect,
            Hover(u64),
            Panel(bool),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Show),
                Just(Op::Hide),
                Just(Op::EnterPick),
                Just(Op::ExitPick),
                (1u64..5).prop_map(Op::Select),
                Just(Op::Deselect),
                (1u64..5).prop_map(Op::Hover),
                any::<bool>().prop_map(Op::Panel),
            ]
        }

        proptest! {
            #[test]
            fn pointer_move_attached_iff_picking(ops in proptest::collection::vec(op(), 0..80)) {
                let gate = EventGate::new();
                let mut machine = InspectionMachine::new(gate.clone());

                for op in ops {
                    match op {
                        Op::Show => { machine.show(); }
                        Op::Hide => { machine.hide(); }
                        Op::EnterPick => { machine.enter_pick_mode(); }
                        Op::ExitPick => { machine.exit_pick_mode(); }
                        Op::Select(i) => {
                            machine.select_element(ElementHandle::new(i), Measurement::default());
                        }
                        Op::Deselect => { machine.deselect_element(); }
                        Op::Hover(i) => { machine.set_hovered(Some(ElementHandle::new(i))); }
                        Op::Panel(open) => machine.set_panel_open(open),
                    }

                    let mode = machine.mode();
                    prop_assert_eq!(
                        gate.is_attached(ListenerKind::PointerMove),
                        mode == InspectionMode::Picking
                    );
                    let mut expected = mode.listeners().to_vec();
                    expected.sort();
                    prop_assert_eq!(gate.attached(), expected);
                    prop_assert!(machine.state().is_consistent());
                    prop_assert!(machine.history().len() <= DEFAULT_HISTORY_CAPACITY);
                }
            }
        }
    }
}
