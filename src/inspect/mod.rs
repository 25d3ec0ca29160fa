//! Inspection state machine and pointer plumbing.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | Modes and the state record handed to subscribers |
//! | `machine` | Transitions, listener gating, selection history |
//! | `hover` | Overlay-masked hit testing and hover debouncing |
//! | `frame` | Scroll/resize refresh coalescing |

// ============================================================================
// Submodules
// ============================================================================

/// Viewport refresh coalescing.
pub mod frame;

/// Hit testing and hover debouncing.
pub mod hover;

/// Inspection state machine.
pub mod machine;

/// Modes and session state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{FRAME_INTERVAL, FrameCoalescer, FrameTick};
pub use hover::{HoverDebouncer, HoverTick, hit_test};
pub use machine::InspectionMachine;
pub use state::{InspectionMode, InspectionState, SelectedElement};
