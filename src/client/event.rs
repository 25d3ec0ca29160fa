//! Page events delivered to the client runtime.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::dom::{ListenerKind, Point};

// ============================================================================
// Key
// ============================================================================

/// Keyboard key relevant to the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Escape.
    Escape,
    /// Any other key, by its `key` value.
    Other(String),
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_string()),
        }
    }
}

// ============================================================================
// PageEvent
// ============================================================================

/// Event raised by the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Pointer moved.
    PointerMove(Point),
    /// Click.
    Click {
        /// Click position.
        point: Point,
    },
    /// Key pressed.
    KeyDown(Key),
    /// Scroll or resize.
    Viewport,
    /// Page visibility changed.
    Visibility(bool),
    /// User expanded or collapsed the panel.
    PanelToggled(bool),
}

impl PageEvent {
    /// Listener that must be attached for the event to be delivered.
    ///
    /// `None` for events that are always delivered.
    #[must_use]
    pub fn listener(&self) -> Option<ListenerKind> {
        match self {
            Self::PointerMove(_) => Some(ListenerKind::PointerMove),
            Self::Click { .. } => Some(ListenerKind::Click),
            Self::KeyDown(_) => Some(ListenerKind::KeyDown),
            Self::Viewport => Some(ListenerKind::Viewport),
            Self::Visibility(_) | Self::PanelToggled(_) => None,
        }
    }
}

/// Sender the page uses to deliver events. Dropping every sender stops the
/// runtime.
pub type PageEventSender = mpsc::UnboundedSender<PageEvent>;

// ============================================================================
// Tests
// ============================================================================
