//! Staging table with capacity eviction.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::entry::{Added, Reconciled, StagedElement, ToggleOutcome};
use crate::dom::{Badge, PageDom, build_selector, build_summary};
use crate::error::{Error, Result};
use crate::identifiers::{ElementHandle, StagedId, SubscriptionId, new_epoch};
use crate::protocol::StagedElementWire;
use crate::subscribers::Subscribers;

// ============================================================================
// StagingManager
// ============================================================================

/// Ordered table of staged elements.
///
/// - Insertion order is the only order; display numbers are derived from it
/// - At capacity, `add` evicts the oldest entry (FIFO)
/// - Element identity goes through an explicit handle to id index, so one
///   live element is never staged twice
/// - Every mutation notifies subscribers once with the full snapshot
///
/// # Example
///
/// ```ignore
/// let mut staging = StagingManager::new(5)?;
/// staging.subscribe(|snapshot| println!("{} staged", snapshot.len()));
///
/// if let Some(ToggleOutcome::Added(added)) = staging.toggle(&dom, element) {
///     println!("staged as {}", added.id);
/// }
/// ```
#[derive(Debug)]
pub struct StagingManager {
    entries: Vec<StagedElement>,
    index: FxHashMap<ElementHandle, StagedId>,
    capacity: usize,
    epoch: String,
    sequence: u64,
    subscribers: Subscribers<[StagedElement]>,
}

// ============================================================================
// StagingManager - Constructor
// ============================================================================

impl StagingManager {
    /// Creates an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("staging capacity must be at least 1"));
        }

        let epoch = new_epoch();
        debug!(capacity, %epoch, "Staging table created");

        Ok(Self {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::default(),
            capacity,
            epoch,
            sequence: 0,
            subscribers: Subscribers::new(),
        })
    }
}

// ============================================================================
// StagingManager - Accessors
// ============================================================================

impl StagingManager {
    /// Current entries in insertion order.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &[StagedElement] {
        &self.entries
    }

    /// Number of staged entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Id of the entry staging `element`.
    #[inline]
    #[must_use]
    pub fn id_of(&self, element: ElementHandle) -> Option<&StagedId> {
        self.index.get(&element)
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, id: &StagedId) -> Option<&StagedElement> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// 1-based display number derived from current order.
    #[must_use]
    pub fn display_number(&self, id: &StagedId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.id == id)
            .map(|position| position + 1)
    }

    /// Projects an entry for the wire.
    #[inline]
    #[must_use]
    pub fn to_wire(entry: &StagedElement) -> StagedElementWire {
        entry.to_wire()
    }

    /// Projects the whole table for the wire.
    #[must_use]
    pub fn wire_snapshot(&self) -> Vec<StagedElementWire> {
        self.entries.iter().map(StagedElement::to_wire).collect()
    }

    /// Badges for the current table, numbered from 1.
    #[must_use]
    pub fn badges(&self, emphasized: &[StagedId]) -> Vec<Badge> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| Badge {
                id: entry.id.clone(),
                element: entry.element,
                number: position + 1,
                emphasized: emphasized.contains(&entry.id),
            })
            .collect()
    }
}

// ============================================================================
// StagingManager - Mutations
// ============================================================================

impl StagingManager {
    /// Stages `element`, or unstages it if it is already staged.
    ///
    /// Returns `None` when the element cannot be described by the page.
    pub fn toggle<D: PageDom + ?Sized>(
        &mut self,
        dom: &D,
        element: ElementHandle,
    ) -> Option<ToggleOutcome> {
        if let Some(id) = self.index.get(&element).cloned() {
            return self.remove(&id).map(ToggleOutcome::Removed);
        }
        self.add(dom, element).map(ToggleOutcome::Added)
    }

    /// Stages `element` under a fresh id, evicting the oldest entry when full.
    ///
    /// Returns `None` if the element is already staged or cannot be
    /// described.
    pub fn add<D: PageDom + ?Sized>(&mut self, dom: &D, element: ElementHandle) -> Option<Added> {
        if self.index.contains_key(&element) {
            trace!(%element, "Element already staged");
            return None;
        }

        let Some(info) = dom.describe(element) else {
            debug!(%element, "Cannot stage undescribed element");
            return None;
        };
        let selector = build_selector(dom, element)?;

        let evicted = if self.entries.len() >= self.capacity {
            let oldest = self.entries.remove(0);
            self.index.remove(&oldest.element);
            debug!(id = %oldest.id, "Evicted oldest staged element");
            Some(oldest)
        } else {
            None
        };

        self.sequence += 1;
        let id = StagedId::new(&self.epoch, self.sequence);
        let entry = StagedElement {
            id: id.clone(),
            summary: build_summary(&info),
            selector,
            element,
            measurement: dom.measure(element),
            component: info.component,
        };

        debug!(%id, %element, summary = %entry.summary, "Element staged");

        self.index.insert(element, id.clone());
        self.entries.push(entry);
        self.notify();

        Some(Added { id, evicted })
    }

    /// Removes an entry. Later entries shift down one display number.
    pub fn remove(&mut self, id: &StagedId) -> Option<StagedElement> {
        let position = self.entries.iter().position(|entry| &entry.id == id)?;
        let entry = self.entries.remove(position);
        self.index.remove(&entry.element);

        debug!(%id, "Element unstaged");
        self.notify();
        Some(entry)
    }

    /// Removes every entry with a single notification.
    ///
    /// Returns the removed entries; an empty table is left untouched.
    pub fn clear(&mut self) -> Vec<StagedElement> {
        if self.entries.is_empty() {
            return Vec::new();
        }

        self.index.clear();
        let removed = std::mem::take(&mut self.entries);

        debug!(count = removed.len(), "Staging table cleared");
        self.notify();
        removed
    }

    /// Rebinds entries whose element left the document.
    ///
    /// A stale entry is re-located through its selector, keeping its id and
    /// position; entries that cannot be re-located are dropped.
    pub fn reconcile<D: PageDom + ?Sized>(&mut self, dom: &D) -> Reconciled {
        let mut result = Reconciled::default();
        let mut kept = Vec::with_capacity(self.entries.len());

        for mut entry in std::mem::take(&mut self.entries) {
            if dom.is_connected(entry.element) {
                kept.push(entry);
                continue;
            }

            self.index.remove(&entry.element);
            match dom.query(&entry.selector) {
                Some(fresh) if !self.index.contains_key(&fresh) => {
                    debug!(id = %entry.id, from = %entry.element, to = %fresh, "Staged element relocated");
                    entry.element = fresh;
                    self.index.insert(fresh, entry.id.clone());
                    result.relocated.push(entry.id.clone());
                    kept.push(entry);
                }
                _ => {
                    debug!(id = %entry.id, selector = %entry.selector, "Staged element lost");
                    result.dropped.push(entry);
                }
            }
        }

        self.entries = kept;
        if result.changed() {
            self.notify();
        }
        result
    }
}

// ============================================================================
// StagingManager - Subscriptions
// ============================================================================

impl StagingManager {
    /// Registers a snapshot handler.
    pub fn subscribe(
        &mut self,
        handler: impl Fn(&[StagedElement]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    /// Removes a snapshot handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn notify(&self) {
        trace!(
            count = self.entries.len(),
            subscribers = self.subscribers.len(),
            "Notifying staging subscribers"
        );
        self.subscribers.notify(&self.entries);
    }
}

// ============================================================================
// Tests
// ============================================================================
