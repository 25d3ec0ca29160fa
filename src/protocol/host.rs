//! Host → client messages.
//!
//! # Format
//!
//! ```json
//! { "type": "set-inspect-mode", "enabled": true }
//! { "type": "highlight-staged", "ids": ["3f2a9c1e-1", "3f2a9c1e-4"] }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::StagedId;

use super::codec::WireMessage;

// ============================================================================
// HostMessage
// ============================================================================

/// Messages sent by the host process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    /// Liveness probe; answered with `heartbeat-reply`.
    Heartbeat,

    /// Turn element picking on or off.
    SetInspectMode {
        /// Whether picking should be active.
        enabled: bool,
    },

    /// Highlight the element matching a selector.
    HighlightElement {
        /// Selector to resolve in the page.
        selector: String,
    },

    /// Remove the selector highlight and staged emphasis.
    ClearHighlight,

    /// Empty the client's staging table.
    ClearStaged,

    /// Emphasize a subset of staged entries.
    HighlightStaged {
        /// Ids to emphasize; unknown ids are ignored.
        ids: Vec<StagedId>,
    },

    /// Turn multi-select staging on or off.
    SetMultiSelect {
        /// Whether clicks stage elements.
        enabled: bool,
    },
}

impl WireMessage for HostMessage {
    const TAGS: &'static [&'static str] = &[
        "heartbeat",
        "set-inspect-mode",
        "highlight-element",
        "clear-highlight",
        "clear-staged",
        "highlight-staged",
        "set-multi-select",
    ];

    fn tag(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::SetInspectMode { .. } => "set-inspect-mode",
            Self::HighlightElement { .. } => "highlight-element",
            Self::ClearHighlight => "clear-highlight",
            Self::ClearStaged => "clear-staged",
            Self::HighlightStaged { .. } => "highlight-staged",
            Self::SetMultiSelect { .. } => "set-multi-select",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
