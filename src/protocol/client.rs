//! Client → host messages.
//!
//! # Format
//!
//! ```json
//! { "type": "element-staged", "payload": { "id": "3f2a9c1e-1", ... } }
//! { "type": "selections-cleared" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::StagedId;

use super::codec::WireMessage;
use super::payload::{ErrorPayload, Measurement, StagedElementWire, UnstagedPayload};

// ============================================================================
// ClientMessage
// ============================================================================

/// Messages sent by the in-page client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Sent immediately after every channel open.
    Ready,

    /// Answer to a host `heartbeat`.
    HeartbeatReply,

    /// An element was locked.
    ElementSelected {
        /// Measurement of the locked element.
        payload: Measurement,
    },

    /// Fresh measurement of the locked element (scroll, resize).
    Measurement {
        /// Updated measurement.
        payload: Measurement,
    },

    /// Client-side error report.
    Error {
        /// Error details.
        payload: ErrorPayload,
    },

    /// An element was added to the staging table.
    ElementStaged {
        /// Wire projection of the new entry.
        payload: StagedElementWire,
    },

    /// An element was removed from the staging table.
    ElementUnstaged {
        /// Id of the removed entry.
        payload: UnstagedPayload,
    },

    /// The staging table was emptied.
    SelectionsCleared,
}

impl ClientMessage {
    /// Creates an `error` message.
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            payload: ErrorPayload {
                message: message.into(),
            },
        }
    }

    /// Creates an `element-unstaged` message.
    #[inline]
    #[must_use]
    pub fn unstaged(id: StagedId) -> Self {
        Self::ElementUnstaged {
            payload: UnstagedPayload { id },
        }
    }
}

impl WireMessage for ClientMessage {
    const TAGS: &'static [&'static str] = &[
        "ready",
        "heartbeat-reply",
        "element-selected",
        "measurement",
        "error",
        "element-staged",
        "element-unstaged",
        "selections-cleared",
    ];

    fn tag(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::HeartbeatReply => "heartbeat-reply",
            Self::ElementSelected { .. } => "element-selected",
            Self::Measurement { .. } => "measurement",
            Self::Error { .. } => "error",
            Self::ElementStaged { .. } => "element-staged",
            Self::ElementUnstaged { .. } => "element-unstaged",
            Self::SelectionsCleared => "selections-cleared",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
