//! WebSocket protocol message types.
//!
//! This module defines the message format exchanged between the in-page
//! client and the host process.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`ClientMessage`] | Client → Host | Readiness, selections, measurements |
//! | [`HostMessage`] | Host → Client | Mode changes, highlights, heartbeats |
//!
//! Every message is a flat JSON object tagged by a kebab-case `type`.
//! Unknown tags are ignored by the receiver; malformed payloads are
//! reported locally and only that frame is dropped.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | Client → host messages |
//! | `codec` | Encoding and tolerant decoding |
//! | `host` | Host → client messages |
//! | `payload` | Measurements and staged-element records |

// ============================================================================
// Submodules
// ============================================================================

/// Client → host messages.
pub mod client;

/// Frame encoding and decoding.
pub mod codec;

/// Host → client messages.
pub mod host;

/// Payload records.
pub mod payload;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::ClientMessage;
pub use codec::{Decoded, WireMessage, decode, encode};
pub use host::HostMessage;
pub use payload::{
    BoxModel, ComponentInfo, Edges, ErrorPayload, Measurement, Rect, SourceLocation,
    StagedElementWire, UnstagedPayload,
};
