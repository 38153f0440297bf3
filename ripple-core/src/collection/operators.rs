//! Derived sources.
//!
//! Every operator here returns a [`ManagedSource`] whose producer subscribes
//! to the receiver. The derived source keeps itself alive while it has
//! subscribers and drops its upstream subscription when it is torn down.
//!
//! Derived sources replay their most recent value. Changeset sources replay
//! it as a reset of the latest collection, so like a collection they start
//! every subscriber from the full state.

use parking_lot::Mutex;

use super::changeset::Changeset;
use crate::config::SourceOptions;
use crate::reactive::{ManagedSource, Observable};

/// Operators available on every [`Observable`].
pub trait ObservableExt: Observable + Sized {
    /// A source emitting `transform` of every value.
    fn map<U, F>(&self, transform: F) -> ManagedSource<U>
    where
        U: Clone + Send + 'static,
        F: Fn(&Self::Item) -> U + Send + Sync + 'static,
    {
        ManagedSource::new(self.replay_length(), |sink| {
            Some(self.subscribe(move |value| sink.send(transform(value))))
        })
    }

    /// A source turning a stream of snapshots into changesets.
    ///
    /// The first snapshot becomes a reset; every later one is diffed against
    /// its predecessor with `equals`.
    fn diff_snapshots<T, E>(&self, equals: E) -> ManagedSource<Changeset<Vec<T>>>
    where
        Self: Observable<Item = Vec<T>>,
        T: Clone + Send + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let previous: Mutex<Option<Vec<T>>> = Mutex::new(None);
        let options = SourceOptions::new().replay_length(1);
        ManagedSource::with_replay(options, Changeset::<Vec<T>>::to_reset, |sink| {
            Some(self.subscribe(move |snapshot: &Vec<T>| {
                let changeset = {
                    let mut previous = previous.lock();
                    let changeset = match previous.as_ref() {
                        Some(previous) => Changeset::between(previous, snapshot.clone(), &equals),
                        None => Changeset::reset(snapshot.clone()),
                    };
                    *previous = Some(snapshot.clone());
                    changeset
                };
                sink.send(changeset);
            }))
        })
    }

    /// A source emitting every changeset with its elements transformed.
    fn map_elements<T, U, F>(&self, transform: F) -> ManagedSource<Changeset<Vec<U>>>
    where
        Self: Observable<Item = Changeset<Vec<T>>>,
        T: Clone + Send + 'static,
        U: Clone + Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let options = SourceOptions::new().replay_length(1);
        ManagedSource::with_replay(options, Changeset::<Vec<U>>::to_reset, |sink| {
            Some(self.subscribe(move |changeset: &Changeset<Vec<T>>| {
                sink.send(changeset.clone().map(&transform))
            }))
        })
    }
}

impl<O: Observable> ObservableExt for O {}
