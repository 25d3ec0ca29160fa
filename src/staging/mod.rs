//! Multi-selection staging.
//!
//! The client-side table of marked elements. It is the source of truth for
//! what is staged; the host only ever sees [`StagedElementWire`] projections
//! and rebuilds its own snapshot from them.
//!
//! | Operation | Notifies | Wire message (sent by the session) |
//! |-----------|----------|-----------------------------------|
//! | `add` | once | `element-staged` (after `element-unstaged` on eviction) |
//! | `remove` | once | `element-unstaged` |
//! | `clear` | once | `selections-cleared` |
//! | `reconcile` | once if changed | `element-unstaged` per dropped entry |
//!
//! [`StagedElementWire`]: crate::protocol::StagedElementWire

// ============================================================================
// Submodules
// ============================================================================

/// Staged entries and mutation outcomes.
pub mod entry;

/// Staging table.
pub mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub use entry::{Added, Reconciled, StagedElement, ToggleOutcome};
pub use manager::StagingManager;
