//! Dispatcher Implementation
//!
//! The dispatcher is the lowest layer of the event core. It owns a table of
//! observer callbacks and delivers values to them.
//!
//! # How Dispatch Works
//!
//! 1. `subscribe` stores the callback under a fresh, monotonically increasing
//!    [`SubscriptionId`] and returns a [`Subscription`] that removes it again.
//!
//! 2. `dispatch` takes a snapshot of the table and calls every callback that
//!    is still enabled, in registration order. The table lock is not held
//!    while callbacks run, so a callback may subscribe or unsubscribe freely.
//!
//! 3. A `dispatch` issued while another one is in progress (typically a
//!    callback emitting on its own source) is handled by the configured
//!    [`ReentrancyPolicy`]: dropped by default, or queued and delivered after
//!    the outer dispatch finishes.
//!
//! # Thread Safety
//!
//! Registration is guarded by a mutex and may happen from any thread.
//! Emissions are expected to be serialized by the caller; a dispatch that
//! overlaps another one is treated like a re-entrant one.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use super::subscription::{Subscription, SubscriptionId};
use crate::config::ReentrancyPolicy;

/// A registered observer.
struct Observer<T> {
    /// Cleared on unsubscribe so a snapshot taken before removal skips it.
    enabled: AtomicBool,
    callback: Box<dyn Fn(&T) + Send + Sync>,
}

struct DispatcherInner<T> {
    observers: Mutex<IndexMap<SubscriptionId, Arc<Observer<T>>>>,
    next_id: AtomicU64,
    dispatching: AtomicBool,
    policy: ReentrancyPolicy,
    /// Values deferred by `ReentrancyPolicy::Queue`.
    pending: Mutex<VecDeque<T>>,
}

impl<T> DispatcherInner<T> {
    fn remove(&self, id: SubscriptionId) -> bool {
        let removed = self.observers.lock().shift_remove(&id);
        match removed {
            Some(observer) => {
                observer.enabled.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }
}

/// Resets the in-progress flag when dispatch ends, even by unwinding.
struct DispatchGuard<'a>(&'a AtomicBool);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fans values out to a set of observer callbacks.
///
/// Clones share the same observer table.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Dispatcher;
///
/// let dispatcher = Dispatcher::new();
/// let subscription = dispatcher.subscribe(|value: &i32| assert_eq!(*value, 7));
/// dispatcher.dispatch(7);
/// subscription.dispose();
/// ```
pub struct Dispatcher<T> {
    inner: Arc<DispatcherInner<T>>,
}

impl<T> Dispatcher<T>
where
    T: Send + 'static,
{
    /// Create a dispatcher that drops re-entrant dispatches.
    pub fn new() -> Self {
        Self::with_policy(ReentrancyPolicy::Drop)
    }

    pub fn with_policy(policy: ReentrancyPolicy) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                observers: Mutex::new(IndexMap::new()),
                next_id: AtomicU64::new(0),
                dispatching: AtomicBool::new(false),
                policy,
                pending: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn policy(&self) -> ReentrancyPolicy {
        self.inner.policy
    }

    /// Register a callback. It stays registered until the returned
    /// subscription is disposed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId::from_raw(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let observer = Arc::new(Observer {
            enabled: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        self.inner.observers.lock().insert(id, observer);

        let inner = Arc::downgrade(&self.inner);
        Subscription::with_id(id, move || {
            if let Some(inner) = inner.upgrade() {
                inner.remove(id);
            }
        })
    }

    /// Remove a callback by id. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    /// Deliver `value` to every registered callback.
    pub fn dispatch(&self, value: T) {
        if self
            .inner
            .dispatching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            match self.inner.policy {
                ReentrancyPolicy::Drop => {
                    trace!("dropping re-entrant dispatch");
                }
                ReentrancyPolicy::Queue => {
                    trace!("queueing re-entrant dispatch");
                    self.inner.pending.lock().push_back(value);
                }
            }
            return;
        }

        let _guard = DispatchGuard(&self.inner.dispatching);
        let mut next = Some(value);
        while let Some(value) = next {
            self.deliver(&value);
            next = self.inner.pending.lock().pop_front();
        }
    }

    fn deliver(&self, value: &T) {
        let observers: Vec<Arc<Observer<T>>> =
            self.inner.observers.lock().values().cloned().collect();

        for observer in observers {
            if observer.enabled.load(Ordering::Acquire) {
                (observer.callback)(value);
            }
        }
    }

    /// Get the number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.load(Ordering::Acquire)
    }
}

impl<T> Default for Dispatcher<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.inner.policy)
            .field("subscriber_count", &self.inner.observers.lock().len())
            .field("dispatching", &self.inner.dispatching.load(Ordering::Relaxed))
            .finish()
    }
}
