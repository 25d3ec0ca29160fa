//! Page collaborators consumed by the client.
//!
//! The synchronization layer never touches a real DOM. It talks to the page
//! through three traits:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`PageDom`] | Element connectivity, description, hit stack, measurement |
//! | [`Overlay`] | Inspector UI: panel, highlight, hover box, badges, notices |
//! | [`ListenerRegistry`] | Global listener attachment driven by mode |
//!
//! [`MemoryDom`] and [`RecordingOverlay`] are in-memory implementations for
//! tests and benches; [`EventGate`] is the registry used by the runtime.

// ============================================================================
// Submodules
// ============================================================================

/// In-memory page and overlay.
pub mod memory;

/// Reproducible selectors and summaries.
pub mod selector;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::identifiers::{ElementHandle, StagedId};
use crate::protocol::{ComponentInfo, Measurement};

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryDom, OverlayCall, RecordingOverlay};
pub use selector::{build_selector, build_summary};

// ============================================================================
// Point
// ============================================================================

/// Viewport coordinates in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// ElementInfo
// ============================================================================

/// Static description of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    /// Lowercase tag name.
    pub tag: String,
    /// `id` attribute, if any.
    pub id: Option<String>,
    /// Class list in document order.
    pub classes: Vec<String>,
    /// Framework component owning the element.
    pub component: Option<ComponentInfo>,
}

impl ElementInfo {
    /// Creates a description with just a tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets the `id` attribute.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Appends a class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Sets the owning component.
    #[must_use]
    pub fn with_component(mut self, component: ComponentInfo) -> Self {
        self.component = Some(component);
        self
    }
}

// ============================================================================
// PageDom
// ============================================================================

/// Read access to the live page.
///
/// Handles may dangle: every method tolerates an element that has been
/// removed from the document.
pub trait PageDom {
    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: ElementHandle) -> bool;

    /// Describes the element.
    fn describe(&self, element: ElementHandle) -> Option<ElementInfo>;

    /// Parent element, `None` at the root.
    fn parent(&self, element: ElementHandle) -> Option<ElementHandle>;

    /// 1-based position among siblings with the same tag, and their count.
    fn nth_of_type(&self, element: ElementHandle) -> Option<(usize, usize)>;

    /// Elements under `point`, topmost first.
    fn elements_at(&self, point: Point) -> Vec<ElementHandle>;

    /// First element matching `selector`.
    fn query(&self, selector: &str) -> Option<ElementHandle>;

    /// Measures the element.
    fn measure(&self, element: ElementHandle) -> Option<Measurement>;

    /// Whether `element` is `ancestor` or one of its descendants.
    fn is_within(&self, element: ElementHandle, ancestor: ElementHandle) -> bool {
        let mut current = Some(element);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}

// ============================================================================
// Overlay
// ============================================================================

/// One numbered badge drawn over a staged element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// Staged entry the badge belongs to.
    pub id: StagedId,
    /// Element the badge is anchored to.
    pub element: ElementHandle,
    /// Display number, contiguous from 1.
    pub number: usize,
    /// Emphasized by a host highlight request.
    pub emphasized: bool,
}

/// The inspector's own UI.
pub trait Overlay {
    /// Root nodes of the overlay; hit tests skip everything inside them.
    fn roots(&self) -> Vec<ElementHandle>;

    /// Shows the inspector panel.
    fn show_panel(&mut self);

    /// Hides the panel and every overlay box.
    fn hide_panel(&mut self);

    /// Draws the selection highlight over an element.
    fn highlight(&mut self, element: ElementHandle, measurement: Option<&Measurement>);

    /// Removes the selection highlight.
    fn clear_highlight(&mut self);

    /// Draws or removes the hover box.
    fn show_hover(&mut self, element: Option<ElementHandle>);

    /// Replaces every badge.
    fn render_badges(&mut self, badges: &[Badge]);

    /// Repositions boxes after scroll or resize.
    fn refresh_positions(&mut self);

    /// Shows a persistent notice in the panel.
    fn show_notice(&mut self, message: &str);
}

// ============================================================================
// Listeners
// ============================================================================

/// Global page listeners the client attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    /// Pointer movement for hover tracking.
    PointerMove,
    /// Click capture for picking.
    Click,
    /// Escape and modifier keys.
    KeyDown,
    /// Scroll and resize.
    Viewport,
}

impl ListenerKind {
    /// Every listener kind.
    pub const ALL: [Self; 4] = [Self::PointerMove, Self::Click, Self::KeyDown, Self::Viewport];
}

/// Attaches and detaches global listeners.
pub trait ListenerRegistry {
    /// Attaches a listener. Attaching twice is harmless.
    fn attach(&mut self, kind: ListenerKind);

    /// Detaches a listener. Detaching a missing listener is harmless.
    fn detach(&mut self, kind: ListenerKind);
}

/// Shared listener set.
///
/// The runtime drops page events whose listener is not attached, so the
/// set is exactly what the page is allowed to deliver.
#[derive(Debug, Clone, Default)]
pub struct EventGate {
    attached: Arc<Mutex<FxHashSet<ListenerKind>>>,
}

impl EventGate {
    /// Creates an empty gate.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `kind` is attached.
    #[inline]
    #[must_use]
    pub fn is_attached(&self, kind: ListenerKind) -> bool {
        self.attached.lock().contains(&kind)
    }

    /// Attached kinds, sorted.
    #[must_use]
    pub fn attached(&self) -> Vec<ListenerKind> {
        let mut kinds: Vec<_> = self.attached.lock().iter().copied().collect();
        kinds.sort();
        kinds
    }
}

impl ListenerRegistry for EventGate {
    fn attach(&mut self, kind: ListenerKind) {
        self.attached.lock().insert(kind);
    }

    fn detach(&mut self, kind: ListenerKind) {
        self.attached.lock().remove(&kind);
    }
}

// ============================================================================
// Tests
// ============================================================================
