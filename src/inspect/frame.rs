//! Viewport refresh coalescing.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

// ============================================================================
// Constants
// ============================================================================

/// One display frame at 60 Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// ============================================================================
// FrameCoalescer
// ============================================================================

/// Marker delivered once per coalesced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick;

/// Collapses bursts of scroll and resize events into one refresh.
///
/// At most one frame is outstanding; the owner calls
/// [`complete`](Self::complete) when it handles the tick.
#[derive(Debug)]
pub struct FrameCoalescer {
    interval: Duration,
    pending: Arc<AtomicBool>,
    tick_tx: mpsc::UnboundedSender<FrameTick>,
}

impl FrameCoalescer {
    /// Creates a coalescer ticking after `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<FrameTick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        (
            Self {
                interval,
                pending: Arc::new(AtomicBool::new(false)),
                tick_tx,
            },
            tick_rx,
        )
    }

    /// Requests a frame. Returns `false` if one is already outstanding.
    pub fn request(&self) -> bool {
        if self.pending.swap(true, Ordering::SeqCst) {
            return false;
        }

        let interval = self.interval;
        let tick_tx = self.tick_tx.clone();
        tokio::spawn(async move {
            sleep(interval).await;
            let _ = tick_tx.send(FrameTick);
        });
        true
    }

    /// Marks the outstanding frame as handled.
    pub fn complete(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    /// Whether a frame is outstanding.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================
