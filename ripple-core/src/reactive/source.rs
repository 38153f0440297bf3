//! Buffered Event Source
//!
//! An [`EventSource`] pairs a [`Dispatcher`] with a [`ReplayBuffer`] holding
//! the last `replay_length` emitted values.
//!
//! # Replay
//!
//! When a callback subscribes, it is first registered with the dispatcher
//! and then synchronously handed every buffered value, oldest first, before
//! `subscribe` returns. A late subscriber therefore catches up with the most
//! recent emissions and then sees live values in emission order.
//!
//! Emission and subscription take the same reentrant delivery lock, so a
//! value emitted on another thread is either replayed or delivered live,
//! never both, and never ahead of the replay. The lock is reentrant so that
//! callbacks can still emit and subscribe on the thread that runs them.
//!
//! A source built with [`EventSource::with_replay`] buffers a projection of
//! every value instead of the value itself. Changeset streams use this to
//! replay a reset rather than the last raw change.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use super::buffer::ReplayBuffer;
use super::dispatcher::Dispatcher;
use super::observable::Observable;
use super::subscription::Subscription;
use crate::config::{ReentrancyPolicy, SourceOptions};

/// A dispatcher with a replay buffer in front of it.
///
/// Clones share the same buffer and observers.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::EventSource;
///
/// let source = EventSource::new(2);
/// source.emit(1);
/// source.emit(2);
/// source.emit(3);
///
/// // Receives 2 and 3 immediately.
/// let _subscription = source.subscribe(|value: &i32| println!("{value}"));
/// ```
pub struct EventSource<T> {
    dispatcher: Dispatcher<T>,
    buffer: Arc<Mutex<ReplayBuffer<T>>>,
    delivery: Arc<ReentrantMutex<()>>,
    replay_as: Option<Arc<ReplayProjection<T>>>,
}

type ReplayProjection<T> = dyn Fn(&T) -> T + Send + Sync;

impl<T> EventSource<T>
where
    T: Clone + Send + 'static,
{
    /// Create a source replaying the last `replay_length` values.
    pub fn new(replay_length: usize) -> Self {
        Self::with_options(SourceOptions::new().replay_length(replay_length))
    }

    pub fn with_options(options: SourceOptions) -> Self {
        Self {
            dispatcher: Dispatcher::with_policy(options.reentrancy),
            buffer: Arc::new(Mutex::new(ReplayBuffer::new(options.replay_length))),
            delivery: Arc::new(ReentrantMutex::new(())),
            replay_as: None,
        }
    }

    /// Create a source that buffers `replay_as(value)` for every emitted
    /// value. Live subscribers still receive the value itself.
    pub fn with_replay<R>(options: SourceOptions, replay_as: R) -> Self
    where
        R: Fn(&T) -> T + Send + Sync + 'static,
    {
        Self {
            replay_as: Some(Arc::new(replay_as)),
            ..Self::with_options(options)
        }
    }

    /// Buffer `value`, then dispatch it.
    ///
    /// The value is buffered even if the dispatch is dropped as re-entrant.
    pub fn emit(&self, value: T) {
        let _delivery = self.delivery.lock();
        {
            let mut buffer = self.buffer.lock();
            if buffer.capacity() > 0 {
                let buffered = match &self.replay_as {
                    Some(project) => project(&value),
                    None => value.clone(),
                };
                buffer.push(buffered);
            }
        }
        self.dispatcher.dispatch(value);
    }

    /// Register `callback` and replay the buffered values to it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let _delivery = self.delivery.lock();
        let callback = Arc::new(callback);
        let registered = Arc::clone(&callback);
        let subscription = self.dispatcher.subscribe(move |value| registered(value));

        let replay: Vec<T> = self.buffer.lock().iter().cloned().collect();
        for value in &replay {
            callback(value);
        }

        subscription
    }

    /// Most recently buffered value.
    pub fn last(&self) -> Option<T> {
        self.buffer.lock().last().cloned()
    }

    pub fn replay_length(&self) -> usize {
        self.buffer.lock().capacity()
    }

    pub fn reentrancy(&self) -> ReentrancyPolicy {
        self.dispatcher.policy()
    }

    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.subscriber_count()
    }
}

impl<T> Clone for EventSource<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            buffer: Arc::clone(&self.buffer),
            delivery: Arc::clone(&self.delivery),
            replay_as: self.replay_as.clone(),
        }
    }
}

impl<T> Observable for EventSource<T>
where
    T: Clone + Send + 'static,
{
    type Item = T;

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        EventSource::subscribe(self, callback)
    }

    fn replay_length(&self) -> usize {
        EventSource::replay_length(self)
    }
}

impl<T> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.buffer.lock();
        f.debug_struct("EventSource")
            .field("dispatcher", &self.dispatcher)
            .field("replay_length", &buffer.capacity())
            .field("buffered", &buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(&i32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        (seen, move |value: &i32| seen_clone.lock().push(*value))
    }

    #[test]
    fn late_subscriber_receives_last_values() {
        let source = EventSource::new(2);
        source.emit(1);
        source.emit(2);
        source.emit(3);

        let (seen, record) = recorder();
        let _subscription = source.subscribe(record);
        assert_eq!(*seen.lock(), vec![2, 3]);

        source.emit(4);
        assert_eq!(*seen.lock(), vec![2, 3, 4]);
    }

    #[test]
    fn zero_replay_delivers_only_live_values() {
        let source = EventSource::new(0);
        source.emit(1);

        let (seen, record) = recorder();
        let _subscription = source.subscribe(record);
        assert!(seen.lock().is_empty());
        assert_eq!(source.last(), None);

        source.emit(2);
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn reentrant_emit_still_updates_buffer() {
        let source = EventSource::new(1);
        let inner = source.clone();
        let (seen, record) = recorder();

        let _emitter = source.subscribe(move |value: &i32| {
            if *value == 1 {
                inner.emit(10);
            }
        });
        let _recorder = source.subscribe(record);

        source.emit(1);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(source.last(), Some(10));
    }

    #[test]
    fn replay_projection_applies_to_buffer_only() {
        let options = SourceOptions::new().replay_length(1);
        let source = EventSource::with_replay(options, |value: &i32| -value);
        let (live, record_live) = recorder();
        let _live = source.subscribe(record_live);

        source.emit(3);

        let (late, record_late) = recorder();
        let _late = source.subscribe(record_late);
        assert_eq!(*live.lock(), vec![3]);
        assert_eq!(*late.lock(), vec![-3]);
        assert_eq!(source.last(), Some(-3));
    }

    #[test]
    fn concurrent_emit_is_replayed_or_delivered_once() {
        for _ in 0..50 {
            let source = EventSource::new(4);
            let emitter = source.clone();
            let handle = std::thread::spawn(move || {
                for value in 0..200 {
                    emitter.emit(value);
                }
            });

            let (seen, record) = recorder();
            let subscription = source.subscribe(record);
            handle.join().unwrap();
            subscription.dispose();

            let seen = seen.lock();
            assert!(seen.windows(2).all(|pair| pair[1] == pair[0] + 1), "{seen:?}");
            assert_eq!(seen.last(), Some(&199));
        }
    }

    #[test]
    fn replay_length_and_policy_come_from_options() {
        let source = EventSource::<i32>::with_options(
            SourceOptions::new()
                .replay_length(4)
                .reentrancy(ReentrancyPolicy::Queue),
        );
        assert_eq!(source.replay_length(), 4);
        assert_eq!(source.reentrancy(), ReentrancyPolicy::Queue);
    }
}
