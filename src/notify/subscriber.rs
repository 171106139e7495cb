//! Subscriber callbacks for successful configuration reloads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback = Box<dyn Fn() + Send + Sync>;

struct Registered {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
}

/// Handle for one subscription.
///
/// Dropping the handle unsubscribes its callback.
pub struct SubscriptionHandle {
    id: usize,
    registry: Arc<Mutex<Registered>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let mut inner = lock(&self.registry);
        inner.subscribers.retain(|(id, _)| *id != self.id);
    }
}

/// Registry of callbacks to run after each successful snapshot swap.
///
/// Callbacks are invoked from the reload path while the registry is locked;
/// they must not subscribe or unsubscribe from within the callback.
pub struct SubscriberRegistry {
    inner: Arc<Mutex<Registered>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registered {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register `callback`; it runs after every successful reload until the
    /// returned handle is dropped.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Run every registered callback, in subscription order.
    pub fn notify_all(&self) {
        let inner = lock(&self.inner);
        for (_, callback) in &inner.subscribers {
            callback();
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// A panicking callback poisons the mutex; the registry itself is still
// consistent, so keep going with the recovered guard.
fn lock(registry: &Arc<Mutex<Registered>>) -> MutexGuard<'_, Registered> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
