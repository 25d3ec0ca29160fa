//! Callback lists for snapshot and mode subscriptions.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::SubscriptionId;

// ============================================================================
// Types
// ============================================================================

/// Subscription callback.
pub type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Ordered list of subscription callbacks.
///
/// Handlers run synchronously, in subscription order, on the thread that
/// performed the mutation.
pub struct Subscribers<T: ?Sized> {
    handlers: Vec<(SubscriptionId, Handler<T>)>,
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.handlers.len())
            .finish()
    }
}

impl<T: ?Sized> Subscribers<T> {
    /// Creates an empty list.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler.
    pub fn subscribe(&mut self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Calls every handler with `value`.
    pub fn notify(&self, value: &T) {
        for (_, handler) in &self.handlers {
            handler(value);
        }
    }

    /// Number of handlers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether there are no handlers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;

    #[test]
    fn test_notify_in_order_and_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers: Subscribers<str> = Subscribers::new();

        let first = {
            let seen = Arc::clone(&seen);
            subscribers.subscribe(move |value: &str| seen.lock().push(format!("a:{value}")))
        };
        {
            let seen = Arc::clone(&seen);
            subscribers.subscribe(move |value: &str| seen.lock().push(format!("b:{value}")));
        }

        subscribers.notify("x");
        assert!(subscribers.unsubscribe(first));
        assert!(!subscribers.unsubscribe(first));
        subscribers.notify("y");

        assert_eq!(*seen.lock(), vec!["a:x", "b:x", "b:y"]);
        assert_eq!(subscribers.len(), 1);
    }
}
