//! Per-transport reconnection bookkeeping.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::config::ReconnectPolicy;

// ============================================================================
// RetryDecision
// ============================================================================

/// Outcome of asking the record whether to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; `attempt` is 1-based.
    Retry {
        /// Attempt number about to be made.
        attempt: u32,
        /// Delay before the attempt.
        delay: Duration,
    },
    /// The attempt budget just ran out. Returned once per cycle.
    Exhausted,
    /// No reconnection: intentional close, or already exhausted.
    Suppressed,
}

// ============================================================================
// ConnectionRecord
// ============================================================================

/// Attempt counter, last delay and the intentional-close flag.
///
/// `intentional_close` suppresses every reconnection until [`reset`]
/// is called by a fresh `connect()`.
///
/// [`reset`]: ConnectionRecord::reset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionRecord {
    attempt_count: u32,
    next_delay: Option<Duration>,
    intentional_close: bool,
    exhausted: bool,
}

impl ConnectionRecord {
    /// Creates an empty record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reconnection attempts made in the current cycle.
    #[inline]
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Delay chosen for the pending attempt, if any.
    #[inline]
    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        self.next_delay
    }

    /// Whether the owner closed the channel on purpose.
    #[inline]
    #[must_use]
    pub fn intentional_close(&self) -> bool {
        self.intentional_close
    }

    /// Whether the attempt budget ran out.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Starts a fresh cycle. Called by `connect()`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a successful open.
    pub fn mark_open(&mut self) {
        self.attempt_count = 0;
        self.next_delay = None;
        self.exhausted = false;
    }

    /// Records an intentional shutdown.
    pub fn mark_intentional(&mut self) {
        self.intentional_close = true;
        self.next_delay = None;
    }

    /// Resets the attempt budget without clearing the intentional flag.
    ///
    /// Returns `false` when an intentional close forbids reconnecting.
    pub fn rearm(&mut self) -> bool {
        if self.intentional_close {
            return false;
        }
        self.attempt_count = 0;
        self.next_delay = None;
        self.exhausted = false;
        true
    }

    /// Decides whether and when to reconnect after a close or failed open.
    pub fn next_retry(&mut self, clean: bool, policy: &ReconnectPolicy) -> RetryDecision {
        if self.intentional_close || self.exhausted {
            return RetryDecision::Suppressed;
        }
        if self.attempt_count >= policy.max_attempts {
            self.exhausted = true;
            self.next_delay = None;
            return RetryDecision::Exhausted;
        }

        let delay = policy.delay_for(self.attempt_count, clean);
        self.attempt_count += 1;
        self.next_delay = Some(delay);

        RetryDecision::Retry {
            attempt: self.attempt_count,
            delay,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
