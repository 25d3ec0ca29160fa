//! Inspector Link - browser/host synchronization for a live element inspector.
//!
//! An in-page client lets the user hover, lock and stage DOM elements; a
//! long-lived host process mirrors what is selected so terminals, editors
//! and agents can act on it.
//!
//! # Architecture
//!
//! The link follows a client-server model over one WebSocket:
//!
//! - **Host (tokio process)**: binds a local port, sends commands, rebuilds
//!   its snapshot from client events
//! - **Client (in-page)**: owns the staging table and the inspection state
//!   machine, replays its state after every reconnect
//!
//! Key design principles:
//!
//! - The client staging table is the source of truth; the host cache is a
//!   mirror that is reset on every `ready`
//! - Listener lifetimes are derived from inspection mode through enter/exit
//!   transition pairs
//! - Element identity is an explicit handle-to-id index, never an
//!   annotation on the DOM node
//! - Messages sent while the channel is down are dropped, not queued
//!
//! # Quick Start
//!
//! ```ignore
//! use inspector_link::{HostBuilder, HostEvent, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut host = HostBuilder::new().project_dir(".").build().await?;
//!     let script = host.injection_script()?;
//!     // Hand `script` to the browser launcher...
//!
//!     host.set_inspect_mode(true);
//!     while let Some(event) = host.next_event().await {
//!         if let HostEvent::SnapshotChanged(snapshot) = event {
//!             println!("{} staged", snapshot.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | In-page session and runtime |
//! | [`config`] | [`ClientOptions`], [`ReconnectPolicy`] |
//! | [`dom`] | Page, overlay and listener seams plus in-memory doubles |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`host`] | [`HostBuilder`], [`HostSession`], context file |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`inspect`] | Inspection state machine, hover and frame scheduling |
//! | [`protocol`] | Wire message types and codec |
//! | [`staging`] | Multi-select staging table |
//! | [`transport`] | WebSocket client and server |

// ============================================================================
// Modules
// ============================================================================

/// In-page client.
pub mod client;

/// Configuration types.
pub mod config;

/// DOM, overlay and listener seams.
pub mod dom;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Host process side.
pub mod host;

/// Type-safe identifiers.
pub mod identifiers;

/// Inspection state machine and scheduling.
pub mod inspect;

/// WebSocket protocol message types.
pub mod protocol;

/// Multi-select staging.
pub mod staging;

/// Subscription callback lists.
pub mod subscribers;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientRuntime, ClientSession, Key, PageEvent, PageEventSender};

// Config types
pub use config::{ClientOptions, ReconnectPolicy};

// DOM seams
pub use dom::{ElementInfo, EventGate, ListenerKind, ListenerRegistry, Overlay, PageDom, Point};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::{ContextWriter, HostBuilder, HostEvent, HostMode, HostSession};

// Identifier types
pub use identifiers::{ElementHandle, SessionId, StagedId, SubscriptionId};

// Inspection types
pub use inspect::{InspectionMachine, InspectionMode, InspectionState, SelectedElement};

// Protocol types
pub use protocol::{ClientMessage, HostMessage, Measurement, Rect, StagedElementWire};

// Staging types
pub use staging::{StagedElement, StagingManager, ToggleOutcome};

// Transport types
pub use transport::{ClientTransport, HostTransport, TransportEvent};
