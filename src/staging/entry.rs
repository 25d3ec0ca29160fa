//! Staged entries and mutation outcomes.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::{ElementHandle, StagedId};
use crate::protocol::{ComponentInfo, Measurement, StagedElementWire};

// ============================================================================
// StagedElement
// ============================================================================

/// One marked element.
///
/// Owned by the [`StagingManager`](super::StagingManager); only the wire
/// projection leaves the client.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedElement {
    pub(super) id: StagedId,
    pub(super) selector: String,
    pub(super) summary: String,
    pub(super) element: ElementHandle,
    pub(super) measurement: Option<Measurement>,
    pub(super) component: Option<ComponentInfo>,
}

impl StagedElement {
    /// Entry id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &StagedId {
        &self.id
    }

    /// Reproducible selector.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Short label.
    #[inline]
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Live element handle.
    #[inline]
    #[must_use]
    pub fn element(&self) -> ElementHandle {
        self.element
    }

    /// Measurement captured when staged.
    #[inline]
    #[must_use]
    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    /// Rendering component.
    #[inline]
    #[must_use]
    pub fn component(&self) -> Option<&ComponentInfo> {
        self.component.as_ref()
    }

    /// Projects the entry for the wire, dropping the element handle.
    #[must_use]
    pub fn to_wire(&self) -> StagedElementWire {
        StagedElementWire {
            id: self.id.clone(),
            selector: self.selector.clone(),
            summary: self.summary.clone(),
            measurement: self.measurement.clone(),
            component: self.component.clone(),
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a successful `add`.
#[derive(Debug, Clone, PartialEq)]
pub struct Added {
    /// Id of the new entry.
    pub id: StagedId,
    /// Oldest entry evicted to make room.
    pub evicted: Option<StagedElement>,
}

/// Result of `toggle`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The element was staged.
    Added(Added),
    /// The element was already staged and has been removed.
    Removed(StagedElement),
}

impl ToggleOutcome {
    /// Returns `true` for [`ToggleOutcome::Added`].
    #[inline]
    #[must_use]
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Result of a reconcile pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// Entries rebound to a fresh element through their selector.
    pub relocated: Vec<StagedId>,
    /// Entries that could not be re-located.
    pub dropped: Vec<StagedElement>,
}

impl Reconciled {
    /// Whether the pass changed the table.
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.relocated.is_empty() || !self.dropped.is_empty()
    }
}
