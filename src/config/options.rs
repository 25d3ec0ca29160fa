//! Client-side options.
//!
//! These are serialized into the injection bootstrap so the in-page client
//! and the host agree on limits.
//!
//! # Example
//!
//! ```ignore
//! use inspector_link::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_staging_capacity(3)
//!     .with_hover_debounce(std::time::Duration::from_millis(50));
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::reconnect::{ReconnectPolicy, duration_ms};

// ============================================================================
// Constants
// ============================================================================

/// Default number of concurrently staged elements.
pub const DEFAULT_STAGING_CAPACITY: usize = 5;

/// Default number of released selections kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Default hover debounce delay.
pub const DEFAULT_HOVER_DEBOUNCE: Duration = Duration::from_millis(32);

// ============================================================================
// ClientOptions
// ============================================================================

/// Options for the in-page client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// Maximum staged elements before FIFO eviction.
    pub staging_capacity: usize,

    /// Maximum released selections kept in history.
    pub history_capacity: usize,

    /// Debounce applied to pointer-move hover detection.
    #[serde(with = "duration_ms")]
    pub hover_debounce: Duration,

    /// Reconnection policy of the client transport.
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            staging_capacity: DEFAULT_STAGING_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            hover_debounce: DEFAULT_HOVER_DEBOUNCE,
            reconnect: ReconnectPolicy::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the staging capacity.
    #[inline]
    #[must_use]
    pub fn with_staging_capacity(mut self, capacity: usize) -> Self {
        self.staging_capacity = capacity;
        self
    }

    /// Sets the selection history capacity.
    #[inline]
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the hover debounce delay.
    #[inline]
    #[must_use]
    pub fn with_hover_debounce(mut self, delay: Duration) -> Self {
        self.hover_debounce = delay;
        self
    }

    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the staging capacity is zero or the
    /// reconnect policy is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.staging_capacity == 0 {
            return Err(Error::config("staging capacity must be at least 1"));
        }
        self.reconnect.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
