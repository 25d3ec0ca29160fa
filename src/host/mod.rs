//! Host process side.
//!
//! | Type | Role |
//! |------|------|
//! | [`HostBuilder`] | Bind address, heartbeat, context file, client options |
//! | [`HostSession`] | Transport + selection cache + intent |
//! | [`SelectionCache`] | Mirror of the client staging table |
//! | [`ContextWriter`] | Markdown snapshot for editor tooling |
//!
//! The host never mutates its cache directly: commands go to the client and
//! the resulting events rebuild the snapshot.

// ============================================================================
// Submodules
// ============================================================================

/// Client bootstrap script.
pub mod bootstrap;

/// Host session builder.
pub mod builder;

/// Selection cache.
pub mod cache;

/// Context file writer.
pub mod context;

/// Host session.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use bootstrap::{build_injection_data_uri, build_injection_script};
pub use builder::HostBuilder;
pub use cache::SelectionCache;
pub use context::ContextWriter;
pub use session::{HostEvent, HostMode, HostSession};
