//! Type-safe identifiers.
//!
//! Newtype wrappers keep staged-selection ids, live element handles,
//! session ids and subscription ids from being mixed up.
//!
//! | Type | Scope |
//! |------|-------|
//! | [`StagedId`] | One staging table (client) |
//! | [`ElementHandle`] | One page load (client) |
//! | [`SessionId`] | One host session |
//! | [`SubscriptionId`] | One listener list |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// StagedId
// ============================================================================

/// Identifier of one staged selection.
///
/// Format: `{epoch}-{sequence}`. The epoch is random per staging table, so
/// an id from a previous page load never matches an entry of the current
/// table, and the sequence never repeats within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagedId(String);

impl StagedId {
    /// Builds an id from a table epoch and sequence number.
    #[inline]
    #[must_use]
    pub fn new(epoch: &str, sequence: u64) -> Self {
        Self(format!("{epoch}-{sequence}"))
    }

    /// Wraps an id received over the wire.
    #[inline]
    #[must_use]
    pub fn from_wire(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StagedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates a fresh staging epoch.
#[must_use]
pub(crate) fn new_epoch() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    uuid[..8].to_string()
}

// ============================================================================
// ElementHandle
// ============================================================================

/// Stable handle to a live DOM element.
///
/// Assigned by the page DOM implementation; equality is element identity.
/// A handle is never serialized onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Creates a handle from its raw arena value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw arena value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Identifier of one host session, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Global counter for subscription ids.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates the next subscription id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// Tests
// ============================================================================
