//! Lifecycle-Managed Source
//!
//! A [`ManagedSource`] is an [`EventSource`] fed by a producer, typically a
//! subscription to some upstream source. The producer only ever sees a
//! [`Sink`], which holds a weak reference to the source.
//!
//! # Lifecycle
//!
//! With [`Lifecycle::Managed`] the source keeps a strong reference to itself
//! for as long as it has at least one subscriber:
//!
//! - the first subscription (count 0 → 1) stores the self-reference;
//! - the last disposal (count → 0) releases it.
//!
//! A source nobody subscribes to and nobody holds is therefore dropped, and
//! dropping it disposes the upstream handle the producer returned. Events
//! sent through a sink after that point are silently discarded.
//!
//! With [`Lifecycle::Normal`] the source lives exactly as long as outside
//! handles to it do.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::observable::Observable;
use super::source::EventSource;
use super::subscription::Subscription;
use crate::config::{Lifecycle, SourceOptions};

struct LifecycleState<T> {
    subscribers: usize,
    /// Strong self-reference held while `subscribers > 0`.
    retained: Option<Arc<ManagedInner<T>>>,
    upstream: Option<Subscription>,
}

struct ManagedInner<T> {
    source: EventSource<T>,
    lifecycle: Lifecycle,
    state: Mutex<LifecycleState<T>>,
}

impl<T> ManagedInner<T> {
    fn release_subscriber(&self) {
        let released = {
            let mut state = self.state.lock();
            state.subscribers = state.subscribers.saturating_sub(1);
            if state.subscribers == 0 {
                state.retained.take()
            } else {
                None
            }
        };

        if released.is_some() {
            trace!("last subscriber gone, releasing managed source");
        }
        // Dropped after the lock is released; this may be the last strong
        // reference.
        drop(released);
    }
}

impl<T> Drop for ManagedInner<T> {
    fn drop(&mut self) {
        if let Some(upstream) = self.state.get_mut().upstream.take() {
            debug!("managed source torn down, disposing upstream");
            upstream.dispose();
        }
    }
}

/// An event source that keeps itself alive while observed.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{EventSource, ManagedSource};
///
/// let upstream = EventSource::new(0);
/// let doubled = ManagedSource::new(0, |sink| {
///     Some(upstream.subscribe(move |value: &i32| sink.send(value * 2)))
/// });
///
/// let _subscription = doubled.subscribe(|value: &i32| assert_eq!(*value, 4));
/// upstream.emit(2);
/// ```
pub struct ManagedSource<T> {
    inner: Arc<ManagedInner<T>>,
}

impl<T> ManagedSource<T>
where
    T: Clone + Send + 'static,
{
    /// Create a managed source replaying `replay_length` values.
    ///
    /// `producer` runs once, immediately. It receives a sink into which
    /// values can be sent and may return an upstream handle that is disposed
    /// when the source is torn down.
    pub fn new<P>(replay_length: usize, producer: P) -> Self
    where
        P: FnOnce(Sink<T>) -> Option<Subscription>,
    {
        Self::with_options(SourceOptions::new().replay_length(replay_length), producer)
    }

    pub fn with_options<P>(options: SourceOptions, producer: P) -> Self
    where
        P: FnOnce(Sink<T>) -> Option<Subscription>,
    {
        Self::from_source(EventSource::with_options(options), options.lifecycle, producer)
    }

    /// Like [`ManagedSource::with_options`], but new subscribers are replayed
    /// `replay_as` of the buffered values (see [`EventSource::with_replay`]).
    pub fn with_replay<R, P>(options: SourceOptions, replay_as: R, producer: P) -> Self
    where
        R: Fn(&T) -> T + Send + Sync + 'static,
        P: FnOnce(Sink<T>) -> Option<Subscription>,
    {
        let source = EventSource::with_replay(options, replay_as);
        Self::from_source(source, options.lifecycle, producer)
    }

    fn from_source<P>(source: EventSource<T>, lifecycle: Lifecycle, producer: P) -> Self
    where
        P: FnOnce(Sink<T>) -> Option<Subscription>,
    {
        let inner = Arc::new(ManagedInner {
            source,
            lifecycle,
            state: Mutex::new(LifecycleState {
                subscribers: 0,
                retained: None,
                upstream: None,
            }),
        });

        let upstream = producer(Sink {
            inner: Arc::downgrade(&inner),
        });
        inner.state.lock().upstream = upstream;

        Self { inner }
    }

    /// Emit a value directly.
    pub fn emit(&self, value: T) {
        self.inner.source.emit(value);
    }

    /// Register `callback`, replaying buffered values first.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        {
            let mut state = self.inner.state.lock();
            state.subscribers += 1;
            if self.inner.lifecycle == Lifecycle::Managed && state.retained.is_none() {
                trace!("first subscriber, retaining managed source");
                state.retained = Some(Arc::clone(&self.inner));
            }
        }

        let subscription = self.inner.source.subscribe(callback);
        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            subscription.dispose();
            if let Some(inner) = inner.upgrade() {
                inner.release_subscriber();
            }
        })
    }

    /// Another sink feeding this source.
    pub fn sink(&self) -> Sink<T> {
        Sink {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn downgrade(&self) -> WeakManagedSource<T> {
        WeakManagedSource {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn last(&self) -> Option<T> {
        self.inner.source.last()
    }

    pub fn replay_length(&self) -> usize {
        self.inner.source.replay_length()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers
    }

    /// Whether the source currently holds a reference to itself.
    pub fn is_retained(&self) -> bool {
        self.inner.state.lock().retained.is_some()
    }
}

impl<T> Clone for ManagedSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Observable for ManagedSource<T>
where
    T: Clone + Send + 'static,
{
    type Item = T;

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        ManagedSource::subscribe(self, callback)
    }

    fn replay_length(&self) -> usize {
        ManagedSource::replay_length(self)
    }
}

impl<T> fmt::Debug for ManagedSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ManagedSource")
            .field("lifecycle", &self.inner.lifecycle)
            .field("subscribers", &state.subscribers)
            .field("retained", &state.retained.is_some())
            .field("source", &self.inner.source)
            .finish()
    }
}

/// A weak handle to a [`ManagedSource`].
pub struct WeakManagedSource<T> {
    inner: Weak<ManagedInner<T>>,
}

impl<T> WeakManagedSource<T> {
    pub fn upgrade(&self) -> Option<ManagedSource<T>> {
        self.inner.upgrade().map(|inner| ManagedSource { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Clone for WeakManagedSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

/// Write end of a [`ManagedSource`].
///
/// Holds only a weak reference: sending into a source that no longer exists
/// does nothing.
pub struct Sink<T> {
    inner: Weak<ManagedInner<T>>,
}

impl<T> Sink<T>
where
    T: Clone + Send + 'static,
{
    pub fn send(&self, value: T) {
        match self.inner.upgrade() {
            Some(inner) => inner.source.emit(value),
            None => trace!("dropping event sent to a released source"),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(&i32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        (seen, move |value: &i32| seen_clone.lock().push(*value))
    }

    #[test]
    fn producer_values_reach_subscribers() {
        let upstream = EventSource::new(0);
        let source = ManagedSource::new(0, |sink| {
            Some(upstream.subscribe(move |value: &i32| sink.send(value + 1)))
        });

        let (seen, record) = recorder();
        let _subscription = source.subscribe(record);
        upstream.emit(1);
        upstream.emit(2);

        assert_eq!(*seen.lock(), vec![2, 3]);
    }

    #[test]
    fn retains_itself_while_subscribed() {
        let source = ManagedSource::<i32>::new(0, |_| None);
        let weak = source.downgrade();

        let subscription = source.subscribe(|_| {});
        assert!(source.is_retained());
        drop(source);

        // Still alive: the subscription keeps it around.
        assert!(weak.is_alive());

        subscription.dispose();
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn external_owner_keeps_source_alive() {
        let source = ManagedSource::<i32>::new(0, |_| None);
        let weak = source.downgrade();

        let subscription = source.subscribe(|_| {});
        subscription.dispose();

        assert!(!source.is_retained());
        assert!(weak.is_alive());
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn retain_count_tracks_multiple_subscribers() {
        let source = ManagedSource::<i32>::new(0, |_| None);
        let weak = source.downgrade();

        let first = source.subscribe(|_| {});
        let second = source.subscribe(|_| {});
        drop(source);

        first.dispose();
        assert!(weak.is_alive());

        second.dispose();
        assert!(!weak.is_alive());
    }

    #[test]
    fn teardown_disposes_upstream() {
        let disposed = Arc::new(AtomicBool::new(false));
        let disposed_clone = disposed.clone();

        let source = ManagedSource::<i32>::new(0, move |_| {
            Some(Subscription::new(move || {
                disposed_clone.store(true, Ordering::SeqCst);
            }))
        });

        let subscription = source.subscribe(|_| {});
        drop(source);
        assert!(!disposed.load(Ordering::SeqCst));

        subscription.dispose();
        assert!(disposed.load(Ordering::SeqCst));
    }

    #[test]
    fn sink_after_teardown_is_silent() {
        let source = ManagedSource::<i32>::new(0, |_| None);
        let sink = source.sink();
        drop(source);

        assert!(!sink.is_alive());
        sink.send(1);
    }

    #[test]
    fn normal_lifecycle_does_not_retain() {
        let source = ManagedSource::<i32>::with_options(
            SourceOptions::new().lifecycle(Lifecycle::Normal),
            |_| None,
        );
        let weak = source.downgrade();

        let subscription = source.subscribe(|_| {});
        assert!(!source.is_retained());
        drop(source);

        assert!(!weak.is_alive());
        subscription.dispose();
    }

    #[test]
    fn values_sent_during_construction_are_replayed() {
        let source = ManagedSource::new(1, |sink| {
            sink.send(5);
            None
        });

        let (seen, record) = recorder();
        let _subscription = source.subscribe(record);
        assert_eq!(*seen.lock(), vec![5]);
    }
}
