//! In-page client.
//!
//! | Type | Role |
//! |------|------|
//! | [`ClientSession`] | Synchronous core: staging, inspection, overlay |
//! | [`ClientRuntime`] | Tokio loop over transport, page, hover and frame events |
//! | [`PageEvent`] | Events the page feeds into the runtime |
//!
//! One session exists per page load; it is constructed explicitly and
//! passed to whatever needs it.

// ============================================================================
// Submodules
// ============================================================================

/// Page events.
pub mod event;

/// Client event loop.
pub mod runtime;

/// Synchronous client core.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Key, PageEvent, PageEventSender};
pub use runtime::ClientRuntime;
pub use session::{ClientSession, MAX_RETRIES_NOTICE};
