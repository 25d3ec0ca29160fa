//! WebSocket transport layer.
//!
//! Each side owns its own transport instance:
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Host (Rust)    │                              │  Page client    │
//! │                 │         WebSocket            │                 │
//! │  HostTransport  │◄────────────────────────────►│ ClientTransport │
//! │  (server)       │      localhost:PORT          │  (reconnects)   │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! Both sides pump their socket through a [`connection::Link`] and surface
//! [`TransportEvent`]s to their owner. Messages sent while the channel is
//! down are dropped; the peers resynchronize on every reconnection.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | Reconnecting client transport |
//! | `connection` | Per-socket event loop |
//! | `event` | Transport events |
//! | `record` | Reconnection bookkeeping |
//! | `server` | Host server with heartbeat |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnecting client transport.
pub mod client;

/// WebSocket link and event loop.
pub(crate) mod connection;

/// Transport events.
pub mod event;

/// Reconnection bookkeeping.
pub mod record;

/// Host WebSocket server.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ClientStream, ClientTransport, Connector, WsConnector};
pub use event::{EventReceiver, TransportEvent};
pub use record::{ConnectionRecord, RetryDecision};
pub use server::{HeartbeatConfig, HostTransport};
