//! In-memory page and overlay.
//!
//! Both types are cheap handles over shared state, so a test can keep a
//! clone and mutate the page (or read the overlay log) while a session owns
//! another clone.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{Badge, ElementInfo, Overlay, PageDom, Point, build_selector};
use crate::identifiers::ElementHandle;
use crate::protocol::{Measurement, Rect};

// ============================================================================
// MemoryDom
// ============================================================================

#[derive(Debug)]
struct Node {
    info: ElementInfo,
    parent: Option<ElementHandle>,
    children: Vec<ElementHandle>,
    connected: bool,
    rect: Rect,
    depth: usize,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: FxHashMap<ElementHandle, Node>,
    next: u64,
}

/// Tree of elements with rectangles.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    state: Arc<Mutex<DomState>>,
}

impl MemoryDom {
    /// Creates an empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element under `parent` (or as a root).
    pub fn insert(&self, parent: Option<ElementHandle>, info: ElementInfo) -> ElementHandle {
        self.insert_with_rect(parent, info, Rect::default())
    }

    /// Appends an element with a layout rectangle.
    pub fn insert_with_rect(
        &self,
        parent: Option<ElementHandle>,
        info: ElementInfo,
        rect: Rect,
    ) -> ElementHandle {
        let mut state = self.state.lock();
        state.next += 1;
        let handle = ElementHandle::new(state.next);

        let depth = match parent.and_then(|p| state.nodes.get_mut(&p)) {
            Some(parent_node) => {
                parent_node.children.push(handle);
                parent_node.depth + 1
            }
            None => 0,
        };

        state.nodes.insert(
            handle,
            Node {
                info,
                parent,
                children: Vec::new(),
                connected: true,
                rect,
                depth,
            },
        );
        handle
    }

    /// Detaches an element and its subtree from the document.
    pub fn remove(&self, element: ElementHandle) {
        let mut state = self.state.lock();
        let parent = state.nodes.get(&element).and_then(|node| node.parent);
        if let Some(parent_node) = parent.and_then(|p| state.nodes.get_mut(&p)) {
            parent_node.children.retain(|child| *child != element);
        }

        let mut stack = vec![element];
        while let Some(handle) = stack.pop() {
            if let Some(node) = state.nodes.get_mut(&handle) {
                node.connected = false;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Replaces an element with a fresh node in the same position.
    ///
    /// Models a hot reload re-rendering a component.
    pub fn replace(&self, element: ElementHandle) -> Option<ElementHandle> {
        let (info, parent, rect, index) = {
            let state = self.state.lock();
            let node = state.nodes.get(&element)?;
            let index = node
                .parent
                .and_then(|p| state.nodes.get(&p))
                .and_then(|p| p.children.iter().position(|c| *c == element));
            (node.info.clone(), node.parent, node.rect, index)
        };

        self.remove(element);
        let fresh = self.insert_with_rect(parent, info, rect);

        if let (Some(parent), Some(index)) = (parent, index) {
            let mut state = self.state.lock();
            if let Some(parent_node) = state.nodes.get_mut(&parent) {
                parent_node.children.retain(|c| *c != fresh);
                parent_node.children.insert(index, fresh);
            }
        }
        Some(fresh)
    }

    /// Moves an element's rectangle.
    pub fn set_rect(&self, element: ElementHandle, rect: Rect) {
        if let Some(node) = self.state.lock().nodes.get_mut(&element) {
            node.rect = rect;
        }
    }

    fn connected_handles(&self) -> Vec<ElementHandle> {
        let state = self.state.lock();
        let mut handles: Vec<_> = state
            .nodes
            .iter()
            .filter(|(_, node)| node.connected)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }
}

impl PageDom for MemoryDom {
    fn is_connected(&self, element: ElementHandle) -> bool {
        self.state
            .lock()
            .nodes
            .get(&element)
            .is_some_and(|node| node.connected)
    }

    fn describe(&self, element: ElementHandle) -> Option<ElementInfo> {
        self.state
            .lock()
            .nodes
            .get(&element)
            .map(|node| node.info.clone())
    }

    fn parent(&self, element: ElementHandle) -> Option<ElementHandle> {
        self.state.lock().nodes.get(&element)?.parent
    }

    fn nth_of_type(&self, element: ElementHandle) -> Option<(usize, usize)> {
        let state = self.state.lock();
        let node = state.nodes.get(&element)?;
        let Some(parent) = node.parent.and_then(|p| state.nodes.get(&p)) else {
            return Some((1, 1));
        };

        let same_tag: Vec<_> = parent
            .children
            .iter()
            .filter(|child| {
                state
                    .nodes
                    .get(child)
                    .is_some_and(|c| c.info.tag == node.info.tag)
            })
            .collect();
        let index = same_tag.iter().position(|c| **c == element)? + 1;
        Some((index, same_tag.len()))
    }

    fn elements_at(&self, point: Point) -> Vec<ElementHandle> {
        let state = self.state.lock();
        let mut hits: Vec<_> = state
            .nodes
            .iter()
            .filter(|(_, node)| node.connected && node.rect.contains(point.x, point.y))
            .map(|(handle, node)| (node.depth, *handle))
            .collect();
        // Deeper and later nodes paint on top.
        hits.sort_by(|a, b| b.cmp(a));
        hits.into_iter().map(|(_, handle)| handle).collect()
    }

    fn query(&self, selector: &str) -> Option<ElementHandle> {
        self.connected_handles()
            .into_iter()
            .find(|handle| build_selector(self, *handle).as_deref() == Some(selector))
    }

    fn measure(&self, element: ElementHandle) -> Option<Measurement> {
        if !self.is_connected(element) {
            return None;
        }
        let selector = build_selector(self, element)?;
        let state = self.state.lock();
        let node = state.nodes.get(&element)?;
        Some(Measurement {
            selector,
            tag: node.info.tag.clone(),
            element_id: node.info.id.clone(),
            classes: node.info.classes.clone(),
            rect: node.rect,
            component: node.info.component.clone(),
            ..Measurement::default()
        })
    }
}

// ============================================================================
// RecordingOverlay
// ============================================================================

/// One call made on a [`RecordingOverlay`].
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    /// `show_panel`
    ShowPanel,
    /// `hide_panel`
    HidePanel,
    /// `highlight`
    Highlight(ElementHandle),
    /// `clear_highlight`
    ClearHighlight,
    /// `show_hover`
    Hover(Option<ElementHandle>),
    /// `render_badges`
    Badges(Vec<Badge>),
    /// `refresh_positions`
    Refresh,
    /// `show_notice`
    Notice(String),
}

#[derive(Debug, Default)]
struct OverlayState {
    roots: Vec<ElementHandle>,
    calls: Vec<OverlayCall>,
}

/// Overlay that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    state: Arc<Mutex<OverlayState>>,
}

impl RecordingOverlay {
    /// Creates an overlay without roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an overlay owning the given roots.
    #[must_use]
    pub fn with_roots(roots: Vec<ElementHandle>) -> Self {
        let overlay = Self::default();
        overlay.state.lock().roots = roots;
        overlay
    }

    /// Every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<OverlayCall> {
        self.state.lock().calls.clone()
    }

    /// Most recent badge set, empty if none was rendered.
    #[must_use]
    pub fn badges(&self) -> Vec<Badge> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find_map(|call| match call {
                OverlayCall::Badges(badges) => Some(badges.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Most recent notice.
    #[must_use]
    pub fn last_notice(&self) -> Option<String> {
        self.state.lock().calls.iter().rev().find_map(|call| match call {
            OverlayCall::Notice(message) => Some(message.clone()),
            _ => None,
        })
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn record(&self, call: OverlayCall) {
        self.state.lock().calls.push(call);
    }
}

impl Overlay for RecordingOverlay {
    fn roots(&self) -> Vec<ElementHandle> {
        self.state.lock().roots.clone()
    }

    fn show_panel(&mut self) {
        self.record(OverlayCall::ShowPanel);
    }

    fn hide_panel(&mut self) {
        self.record(OverlayCall::HidePanel);
    }

    fn highlight(&mut self, element: ElementHandle, _measurement: Option<&Measurement>) {
        self.record(OverlayCall::Highlight(element));
    }

    fn clear_highlight(&mut self) {
        self.record(OverlayCall::ClearHighlight);
    }

    fn show_hover(&mut self, element: Option<ElementHandle>) {
        self.record(OverlayCall::Hover(element));
    }

    fn render_badges(&mut self, badges: &[Badge]) {
        self.record(OverlayCall::Badges(badges.to_vec()));
    }

    fn refresh_positions(&mut self) {
        self.record(OverlayCall::Refresh);
    }

    fn show_notice(&mut self, message: &str) {
        self.record(OverlayCall::Notice(message.to_string()));
    }
}

// ============================================================================
// Tests
// ============================================================================
