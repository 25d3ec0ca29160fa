//! Host-side mirror of the client's staging table.
//!
//! Rebuilt only from client events. Host commands (clear, highlight) go to
//! the client and come back as events; they never touch the cache.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace};

use crate::identifiers::{StagedId, SubscriptionId};
use crate::protocol::{ClientMessage, Measurement, StagedElementWire};
use crate::subscribers::Subscribers;

// ============================================================================
// SelectionCache
// ============================================================================

/// Last known snapshot of staged elements plus the locked selection.
#[derive(Debug, Default)]
pub struct SelectionCache {
    entries: Vec<StagedElementWire>,
    selected: Option<Measurement>,
    subscribers: Subscribers<[StagedElementWire]>,
}

impl SelectionCache {
    /// Creates an empty cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Staged entries in client order.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &[StagedElementWire] {
        &self.entries
    }

    /// Latest locked selection or measurement.
    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<&Measurement> {
        self.selected.as_ref()
    }

    /// 1-based display number of a staged entry.
    #[must_use]
    pub fn display_number(&self, id: &StagedId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.id == id)
            .map(|position| position + 1)
    }

    /// Forgets everything. Called when a client announces `ready`.
    ///
    /// Returns `true` if the snapshot changed.
    pub fn reset(&mut self) -> bool {
        self.selected = None;
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        debug!("Selection cache reset");
        self.notify();
        true
    }

    /// Applies a client message. Returns `true` if the snapshot changed.
    pub fn apply(&mut self, message: &ClientMessage) -> bool {
        let changed = match message {
            ClientMessage::ElementStaged { payload } => {
                match self.entries.iter_mut().find(|entry| entry.id == payload.id) {
                    Some(existing) => *existing = payload.clone(),
                    None => self.entries.push(payload.clone()),
                }
                true
            }

            ClientMessage::ElementUnstaged { payload } => {
                let before = self.entries.len();
                self.entries.retain(|entry| entry.id != payload.id);
                self.entries.len() != before
            }

            ClientMessage::SelectionsCleared => {
                // Always surfaced: the client acknowledged a clear.
                self.entries.clear();
                true
            }

            ClientMessage::ElementSelected { payload } | ClientMessage::Measurement { payload } => {
                self.selected = Some(payload.clone());
                false
            }

            ClientMessage::Ready | ClientMessage::HeartbeatReply | ClientMessage::Error { .. } => {
                false
            }
        };

        if changed {
            trace!(count = self.entries.len(), "Selection cache updated");
            self.notify();
        }
        changed
    }

    /// Registers a snapshot handler.
    pub fn subscribe(
        &mut self,
        handler: impl Fn(&[StagedElementWire]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    /// Removes a snapshot handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn notify(&self) {
        self.subscribers.notify(&self.entries);
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

    fn wire(id: &str, summary: &str) -> StagedElementWire {
        StagedElementWire {
            id: StagedId::from_wire(id),
            selector: format!("#{id}"),
            summary: summary.to_string(),
            measurement: None,
            component: None,
        }
    }

    fn staged(id: &str) -> ClientMessage {
        ClientMessage::ElementStaged {
            payload: wire(id, id),
        }
    }

    #[test]
    fn test_rebuilds_from_events() {
        let mut cache = SelectionCache::new();

        assert!(cache.apply(&staged("a")));
        assert!(cache.apply(&staged("b")));
        assert!(cache.apply(&staged("c")));
        assert!(cache.apply(&ClientMessage::unstaged(StagedId::from_wire("b"))));
        assert!(!cache.apply(&ClientMessage::unstaged(StagedId::from_wire("b"))));

        let ids: Vec<_> = cache.snapshot().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(cache.display_number(&StagedId::from_wire("c")), Some(2));
    }

    #[test]
    fn test_restaging_same_id_replaces_in_place() {
        let mut cache = SelectionCache::new();
        cache.apply(&staged("a"));
        cache.apply(&staged("b"));

        cache.apply(&ClientMessage::ElementStaged {
            payload: wire("a", "Updated"),
        });

        assert_eq!(cache.snapshot().len(), 2);
        assert_eq!(cache.snapshot()[0].summary, "Updated");
    }

    #[test]
    fn test_selection_does_not_touch_snapshot() {
        let mut cache = SelectionCache::new();
        let changed = cache.apply(&ClientMessage::ElementSelected {
            payload: Measurement {
                selector: "#x".into(),
                ..Measurement::default()
            },
        });

        assert!(!changed);
        assert_eq!(cache.selected().map(|m| m.selector.as_str()), Some("#x"));
    }

    #[test]
    fn test_reset_notifies_only_when_non_empty() {
        let mut cache = SelectionCache::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cache.subscribe(move |snapshot| sink.lock().push(snapshot.len()));

        assert!(!cache.reset());
        cache.apply(&staged("a"));
        assert!(cache.reset());

        assert_eq!(*seen.lock(), vec![1, 0]);
        assert!(cache.selected().is_none());
    }
}
