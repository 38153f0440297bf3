//! The subscription interface shared by every source.

use super::subscription::Subscription;

/// Anything callbacks can subscribe to.
///
/// Implemented by [`EventSource`](super::EventSource),
/// [`ManagedSource`](super::ManagedSource), [`Property`](super::Property) and
/// the observable collections. Operators that build derived sources are
/// written against this trait.
pub trait Observable {
    /// The value delivered to callbacks.
    type Item;

    /// Register `callback`. Buffered values, if any, are delivered before
    /// this returns.
    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Self::Item) + Send + Sync + 'static;

    /// Number of values replayed to a new subscriber.
    fn replay_length(&self) -> usize;
}
