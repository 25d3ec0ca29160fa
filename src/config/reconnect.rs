//! Reconnection backoff policy.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use inspector_link::ReconnectPolicy;
//!
//! let policy = ReconnectPolicy::new()
//!     .with_max_attempts(5)
//!     .with_initial_delay(Duration::from_millis(250));
//! policy.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Base delay after an unclean close (network failure).
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Base delay after a clean close (host dropped socket, navigation).
const DEFAULT_CLEAN_DELAY: Duration = Duration::from_millis(100);

/// Upper bound for a single delay before jitter.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Multiplicative backoff factor.
const DEFAULT_FACTOR: f64 = 1.5;

/// Jitter as a fraction of the computed delay.
const DEFAULT_JITTER_RATIO: f64 = 0.25;

/// Reconnection attempts before giving up.
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Exponential backoff settings for the client transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectPolicy {
    /// Base delay after an unclean close.
    #[serde(with = "duration_ms")]
    pub initial_delay: Duration,

    /// Base delay after a clean close.
    #[serde(with = "duration_ms")]
    pub clean_delay: Duration,

    /// Cap applied before jitter.
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,

    /// Multiplicative factor per attempt.
    pub factor: f64,

    /// Maximum random jitter as a fraction of the delay.
    pub jitter_ratio: f64,

    /// Attempts before the terminal max-retries signal.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ReconnectPolicy {
    /// Creates a policy with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            clean_delay: DEFAULT_CLEAN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: DEFAULT_FACTOR,
            jitter_ratio: DEFAULT_JITTER_RATIO,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ReconnectPolicy {
    /// Sets the base delay after an unclean close.
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the base delay after a clean close.
    #[inline]
    #[must_use]
    pub fn with_clean_delay(mut self, delay: Duration) -> Self {
        self.clean_delay = delay;
        self
    }

    /// Sets the delay cap.
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the jitter ratio (0 disables jitter).
    #[inline]
    #[must_use]
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio;
        self
    }

    /// Sets the maximum number of reconnection attempts.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

// ============================================================================
// Delay Computation
// ============================================================================

impl ReconnectPolicy {
    /// Delay before jitter for the given zero-based attempt.
    #[must_use]
    pub fn base_delay(&self, attempt: u32, clean: bool) -> Duration {
        let base = if clean {
            self.clean_delay
        } else {
            self.initial_delay
        };
        let millis = base.as_millis() as f64 * self.factor.powi(attempt as i32);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay including random jitter for the given zero-based attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, clean: bool) -> Duration {
        let base = self.base_delay(attempt, clean);
        let max_jitter = (base.as_millis() as f64 * self.jitter_ratio) as u64;
        if max_jitter == 0 {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0..=max_jitter);
        base + Duration::from_millis(jitter)
    }

    /// Validates the policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the factor is below 1, the jitter ratio
    /// is negative, or the cap is below the base delays.
    pub fn validate(&self) -> Result<()> {
        if self.factor.is_nan() || self.factor < 1.0 {
            return Err(Error::config(format!(
                "reconnect factor must be >= 1.0, got {}",
                self.factor
            )));
        }
        if self.jitter_ratio.is_nan() || self.jitter_ratio < 0.0 {
            return Err(Error::config("reconnect jitter ratio must be >= 0"));
        }
        if self.max_delay < self.initial_delay || self.max_delay < self.clean_delay {
            return Err(Error::config(
                "reconnect max delay must not be below the base delays",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Duration Serialization
// ============================================================================

/// Serializes durations as integer milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
