//! Hover hit testing and debouncing.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

use crate::dom::{PageDom, Point};
use crate::identifiers::ElementHandle;

// ============================================================================
// Hit Testing
// ============================================================================

/// Topmost element under `point` that is not part of the inspector overlay.
pub fn hit_test<D: PageDom + ?Sized>(
    dom: &D,
    overlay_roots: &[ElementHandle],
    point: Point,
) -> Option<ElementHandle> {
    dom.elements_at(point).into_iter().find(|element| {
        !overlay_roots
            .iter()
            .any(|root| dom.is_within(*element, *root))
    })
}

// ============================================================================
// HoverDebouncer
// ============================================================================

/// A debounced pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverTick {
    /// Generation the tick was scheduled under.
    pub generation: u64,
    /// Last pointer position.
    pub point: Point,
}

/// Debounces pointer moves into hover ticks.
///
/// Each `schedule` aborts the pending timer task and bumps the generation;
/// a tick that was already queued before the abort is rejected by
/// [`is_current`](Self::is_current).
#[derive(Debug)]
pub struct HoverDebouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    tick_tx: mpsc::UnboundedSender<HoverTick>,
}

impl HoverDebouncer {
    /// Creates a debouncer and the receiver of its ticks.
    #[must_use]
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<HoverTick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                generation: Arc::new(AtomicU64::new(0)),
                pending: None,
                tick_tx,
            },
            tick_rx,
        )
    }

    /// Debounce delay.
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Supersedes any pending tick with one for `point`.
    pub fn schedule(&mut self, point: Point) {
        self.abort_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = self.delay;
        let tick_tx = self.tick_tx.clone();
        let current = Arc::clone(&self.generation);

        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                let _ = tick_tx.send(HoverTick { generation, point });
            }
        }));
    }

    /// Cancels the pending tick, if any.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `tick` belongs to the latest `schedule`.
    #[inline]
    #[must_use]
    pub fn is_current(&self, tick: &HoverTick) -> bool {
        tick.generation == self.generation.load(Ordering::SeqCst)
    }

    fn abort_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            trace!("Superseding pending hover tick");
            task.abort();
        }
    }
}

impl Drop for HoverDebouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

// ============================================================================
// Tests
// ============================================================================
