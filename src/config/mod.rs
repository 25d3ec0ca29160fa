//! Configuration types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClientOptions`] | In-page client limits and timings |
//! | [`ReconnectPolicy`] | Client transport backoff |
//!
//! Host settings live on [`crate::host::HostBuilder`].

// ============================================================================
// Submodules
// ============================================================================

/// Client-side options.
pub mod options;

/// Reconnection backoff policy.
pub mod reconnect;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::{
    ClientOptions, DEFAULT_HISTORY_CAPACITY, DEFAULT_HOVER_DEBOUNCE, DEFAULT_STAGING_CAPACITY,
};
pub use reconnect::ReconnectPolicy;
