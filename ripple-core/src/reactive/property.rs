//! Property Implementation
//!
//! A Property holds a single value and notifies subscribers whenever it is
//! replaced. It is an [`EventSource`] with a replay length of one, so every
//! subscriber receives the current value immediately and then each new one.
//!
//! # Thread Safety
//!
//! The value lives in the source's replay buffer, guarded by a mutex.
//! Updates should be serialized by the caller, like any emission.

use std::fmt::{self, Debug};

use super::observable::Observable;
use super::source::EventSource;
use super::subscription::Subscription;
use crate::config::{ReentrancyPolicy, SourceOptions};

/// An observable value.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Property;
///
/// let count = Property::new(0);
/// let _subscription = count.subscribe(|value: &i32| println!("count = {value}"));
///
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Property<T> {
    source: EventSource<T>,
}

impl<T> Property<T>
where
    T: Clone + Send + 'static,
{
    /// Create a new property with the given initial value.
    pub fn new(value: T) -> Self {
        Self::with_policy(value, ReentrancyPolicy::Drop)
    }

    pub fn with_policy(value: T, reentrancy: ReentrancyPolicy) -> Self {
        let source = EventSource::with_options(
            SourceOptions::new()
                .replay_length(1)
                .reentrancy(reentrancy),
        );
        source.emit(value);
        Self { source }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        match self.source.last() {
            Some(value) => value,
            None => unreachable!("a property always buffers its current value"),
        }
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.source.emit(value);
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.get());
        self.set(next);
    }

    /// Subscribe to the current value and every later one.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.source.subscribe(callback)
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.source.subscriber_count()
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T> Observable for Property<T>
where
    T: Clone + Send + 'static,
{
    type Item = T;

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Property::subscribe(self, callback)
    }

    fn replay_length(&self) -> usize {
        1
    }
}

impl<T> Debug for Property<T>
where
    T: Clone + Send + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
