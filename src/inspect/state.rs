//! Inspection modes and session state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::ListenerKind;
use crate::identifiers::ElementHandle;
use crate::protocol::Measurement;

// ============================================================================
// InspectionMode
// ============================================================================

/// Client inspection mode.
///
/// | Mode | UI | Listeners |
/// |------|----|-----------|
/// | `Hidden` | none | none |
/// | `Observing` | panel | viewport |
/// | `Picking` | panel + hover box | pointer-move, click, key-down, viewport |
/// | `Locked` | panel + highlight | key-down, viewport |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InspectionMode {
    /// No UI, no listeners.
    #[default]
    Hidden,
    /// Panel visible, no pointer capture.
    Observing,
    /// Pointer capture active, hover target tracked.
    Picking,
    /// One element pinned.
    Locked,
}

impl InspectionMode {
    /// Listeners attached while in this mode.
    #[must_use]
    pub const fn listeners(self) -> &'static [ListenerKind] {
        match self {
            Self::Hidden => &[],
            Self::Observing => &[ListenerKind::Viewport],
            Self::Picking => &[
                ListenerKind::PointerMove,
                ListenerKind::Click,
                ListenerKind::KeyDown,
                ListenerKind::Viewport,
            ],
            Self::Locked => &[ListenerKind::KeyDown, ListenerKind::Viewport],
        }
    }

    /// Mode name as shown to users.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Observing => "observing",
            Self::Picking => "picking",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for InspectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SelectedElement
// ============================================================================

/// The locked element and its latest measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedElement {
    /// Live element.
    pub element: ElementHandle,
    /// Latest measurement.
    pub measurement: Measurement,
}

// ============================================================================
// InspectionState
// ============================================================================

/// Snapshot handed to subscribers.
///
/// `hovered` is only set in `Picking`; `selected` only in `Locked`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionState {
    /// Current mode.
    pub mode: InspectionMode,
    /// Element under the pointer.
    pub hovered: Option<ElementHandle>,
    /// Pinned element.
    pub selected: Option<SelectedElement>,
}

impl InspectionState {
    /// Whether the hover and selection fields agree with the mode.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (self.hovered.is_none() || self.mode == InspectionMode::Picking)
            && (self.selected.is_none() == (self.mode != InspectionMode::Locked))
    }
}
