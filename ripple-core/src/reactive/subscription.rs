//! Subscription handles.
//!
//! A [`Subscription`] represents one observer's registration with a source.
//! Disposing it (explicitly, or by dropping it) removes the observer.

use std::fmt;

use parking_lot::Mutex;

/// Identifier of one registration with a dispatcher.
///
/// Ids are handed out by each dispatcher from a monotonically increasing
/// counter, so they also record registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

type Disposer = Box<dyn FnOnce() + Send>;

/// Handle to a registered observer.
///
/// Dropping this handle unregisters the observer. Use [`Subscription::detach`]
/// to keep the observer registered for as long as its source lives.
#[must_use = "dropping a Subscription immediately unsubscribes the observer"]
pub struct Subscription {
    id: Option<SubscriptionId>,
    disposer: Mutex<Option<Disposer>>,
}

impl Subscription {
    /// Create a subscription that runs `dispose` exactly once.
    pub fn new<F>(dispose: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: None,
            disposer: Mutex::new(Some(Box::new(dispose))),
        }
    }

    pub(crate) fn with_id<F>(id: SubscriptionId, dispose: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: Some(id),
            disposer: Mutex::new(Some(Box::new(dispose))),
        }
    }

    /// A subscription with nothing to dispose.
    pub fn empty() -> Self {
        Self {
            id: None,
            disposer: Mutex::new(None),
        }
    }

    /// The dispatcher registration this handle controls, if it controls one
    /// directly.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// Unregister the observer. Disposing twice is a no-op.
    pub fn dispose(&self) {
        let disposer = self.disposer.lock().take();
        if let Some(dispose) = disposer {
            dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposer.lock().is_none()
    }

    /// Keep the observer registered without holding on to the handle.
    pub fn detach(self) {
        self.disposer.lock().take();
    }

    /// Hand the subscription over to a bag that disposes it later.
    pub fn dispose_with(self, bag: &DisposeBag) {
        bag.insert(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.disposer.get_mut().take() {
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Collects subscriptions and disposes all of them together, at the latest
/// when the bag itself is dropped.
#[derive(Default)]
pub struct DisposeBag {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions.lock().push(subscription);
    }

    /// Dispose every subscription currently in the bag.
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscription in &subscriptions {
            subscription.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag").field("len", &self.len()).finish()
    }
}
