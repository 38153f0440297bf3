//! Observable Collections
//!
//! An [`ObservableCollection`] owns a [`Patchable`] collection and reports
//! every mutation to its subscribers as a [`Changeset`].
//!
//! # Delivery
//!
//! - A new subscriber first receives a reset carrying the current state,
//!   then one changeset per mutation.
//! - Each mutating call goes through the patch protocol and emits exactly one
//!   changeset, after the internal lock has been released.
//! - Inside [`ObservableCollection::batch_update`] nothing is emitted; the
//!   recorded changes are merged and emitted once when the outermost batch
//!   ends.
//!
//! Mutations, batch commits and subscriptions are serialized by a reentrant
//! delivery lock held until their changeset has been delivered. Subscribers
//! on any thread therefore see changesets in the order the collection went
//! through them, and a new subscriber's reset is followed by exactly the
//! changes made after it.
//!
//! A subscriber that mutates the collection from its callback triggers a
//! re-entrant dispatch. Under the default [`ReentrancyPolicy::Drop`] the
//! other subscribers never see that change; build the collection with
//! [`ReentrancyPolicy::Queue`] if callbacks need to write back.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::debug;

use super::changeset::{Change, Changeset};
use crate::config::{ReentrancyPolicy, SourceOptions};
use crate::diff::{Diffable, IndexPath, Operation, Patchable, Tree, TreeArray, TreeNode};
use crate::error::{fatal, PatchError};
use crate::reactive::{EventSource, Observable, Subscription};

struct Batch<T, I> {
    depth: usize,
    change: Change<T, I>,
}

struct State<C: Patchable> {
    collection: C,
    batch: Option<Batch<C::Element, C::Index>>,
}

impl<C: Patchable + Clone> State<C> {
    /// Fold `change` into the open batch, or package it for emission.
    fn record(&mut self, change: Change<C::Element, C::Index>) -> Option<Changeset<C>> {
        match &mut self.batch {
            Some(batch) => {
                batch.change = std::mem::take(&mut batch.change).merge(change);
                None
            }
            None => Some(Changeset::with_change(self.collection.clone(), change)),
        }
    }
}

struct ObservableInner<C: Patchable> {
    state: Mutex<State<C>>,
    source: EventSource<Changeset<C>>,
    /// Held from a change until its changeset has been delivered.
    delivery: ReentrantMutex<()>,
}

/// A collection whose mutations are observable as changesets.
///
/// Clones share the same collection and subscribers.
///
/// # Example
///
/// ```rust
/// use ripple_core::collection::ObservableArray;
///
/// let items = ObservableArray::new(vec![1, 2]);
/// let _subscription = items.subscribe(|changeset| {
///     println!("{:?}", changeset.change());
/// });
///
/// items.push(3);
/// assert_eq!(items.snapshot(), vec![1, 2, 3]);
/// ```
pub struct ObservableCollection<C: Patchable> {
    inner: Arc<ObservableInner<C>>,
}

/// A flat observable list.
pub type ObservableArray<T> = ObservableCollection<Vec<T>>;

/// An observable forest addressed by [`IndexPath`].
pub type ObservableTree<T> = ObservableCollection<TreeArray<T>>;

struct BatchGuard<'a, C>(&'a ObservableCollection<C>)
where
    C: Patchable + Clone + Send + 'static,
    C::Element: Send,
    C::Index: Send;

impl<C> Drop for BatchGuard<'_, C>
where
    C: Patchable + Clone + Send + 'static,
    C::Element: Send,
    C::Index: Send,
{
    fn drop(&mut self) {
        self.0.end_batch();
    }
}

impl<C> ObservableCollection<C>
where
    C: Patchable + Clone + Send + 'static,
    C::Element: Send,
    C::Index: Send,
{
    pub fn new(collection: C) -> Self {
        Self::with_policy(collection, ReentrancyPolicy::Drop)
    }

    pub fn with_policy(collection: C, reentrancy: ReentrancyPolicy) -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                state: Mutex::new(State {
                    collection,
                    batch: None,
                }),
                source: EventSource::with_options(SourceOptions::new().reentrancy(reentrancy)),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Register `callback`. It is called with a reset of the current state
    /// before this returns, then with every later changeset.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Changeset<C>) + Send + Sync + 'static,
    {
        let _delivery = self.inner.delivery.lock();
        let callback = Arc::new(callback);
        let registered = Arc::clone(&callback);

        let (subscription, current) = {
            let mut state = self.inner.state.lock();
            let subscription = self.inner.source.subscribe(move |changeset| registered(changeset));
            // The reset below already contains the batched changes.
            if let Some(batch) = &mut state.batch {
                batch.change = Change::Reset;
            }
            (subscription, Changeset::reset(state.collection.clone()))
        };

        callback(&current);
        subscription
    }

    /// A copy of the current collection.
    pub fn snapshot(&self) -> C {
        self.inner.state.lock().collection.clone()
    }

    /// Run `f` against the current collection without copying it.
    ///
    /// The collection is locked while `f` runs; `f` must not mutate this
    /// observable.
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&C) -> R,
    {
        f(&self.inner.state.lock().collection)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.source.subscriber_count()
    }

    /// Mutate the collection and record the change `mutate` reports.
    fn commit<R, M>(&self, mutate: M) -> Result<R, PatchError>
    where
        M: FnOnce(&mut C) -> Result<(R, Change<C::Element, C::Index>), PatchError>,
    {
        let _delivery = self.inner.delivery.lock();
        let (result, pending) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let (result, change) = mutate(&mut state.collection)?;
            (result, state.record(change))
        };

        if let Some(changeset) = pending {
            self.inner.source.emit(changeset);
        }
        Ok(result)
    }

    pub fn try_apply(&self, operation: Operation<C::Element, C::Index>) -> Result<(), PatchError> {
        self.commit(|collection| {
            collection.try_apply_operation(operation.clone())?;
            Ok(((), Change::Operations(vec![operation])))
        })
    }

    /// Apply a single operation and emit it.
    ///
    /// # Panics
    ///
    /// Panics if the operation addresses an index the collection lacks.
    #[track_caller]
    pub fn apply(&self, operation: Operation<C::Element, C::Index>) {
        fatal(self.try_apply(operation))
    }

    #[track_caller]
    pub fn insert(&self, at: C::Index, element: C::Element) {
        self.apply(Operation::Insert { at, element })
    }

    pub fn try_remove(&self, at: C::Index) -> Result<C::Element, PatchError> {
        self.commit(|collection| {
            let element = collection.try_remove(&at)?;
            Ok((element, Change::Operations(vec![Operation::Delete { at }])))
        })
    }

    /// Remove and return the element at `at`.
    #[track_caller]
    pub fn remove(&self, at: C::Index) -> C::Element {
        fatal(self.try_remove(at))
    }

    /// Replace the element at `at`, returning the old one.
    #[track_caller]
    pub fn update(&self, at: C::Index, element: C::Element) -> C::Element {
        fatal(self.commit(|collection| {
            let old = collection.try_replace(&at, element.clone())?;
            Ok((old, Change::Operations(vec![Operation::Update { at, element }])))
        }))
    }

    #[track_caller]
    pub fn move_element(&self, from: C::Index, to: C::Index) {
        self.apply(Operation::Move { from, to })
    }

    /// Swap in a new collection and tell subscribers to reload.
    pub fn replace(&self, collection: C) {
        fatal(self.commit(|current| {
            *current = collection;
            Ok(((), Change::Reset))
        }))
    }

    /// Swap in a new collection, emitting the diff from the old one.
    ///
    /// A changeset is emitted even when nothing changed.
    #[track_caller]
    pub fn replace_with_diff<E>(&self, collection: C, equals: E)
    where
        C: Diffable,
        E: FnMut(&C::Element, &C::Element) -> bool,
    {
        fatal(self.commit(|current| {
            let diff = current.diff_by(&collection, equals);
            let operations = diff.try_patch(&collection)?;
            *current = collection;
            Ok(((), Change::Operations(operations)))
        }))
    }

    /// Run `update` with emission suspended, then emit everything it did as
    /// one changeset.
    ///
    /// Batches nest; only the outermost one emits. Nothing is emitted if no
    /// change was recorded.
    pub fn batch_update<R, F>(&self, update: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        {
            let mut state = self.inner.state.lock();
            match &mut state.batch {
                Some(batch) => batch.depth += 1,
                None => {
                    state.batch = Some(Batch {
                        depth: 1,
                        change: Change::default(),
                    })
                }
            }
        }

        let _guard = BatchGuard(self);
        update(self)
    }

    fn end_batch(&self) {
        let _delivery = self.inner.delivery.lock();
        let pending = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let finished = match &mut state.batch {
                Some(batch) => {
                    batch.depth -= 1;
                    batch.depth == 0
                }
                None => false,
            };

            let batch = if finished { state.batch.take() } else { None };
            match batch {
                Some(Batch {
                    change: Change::Operations(operations),
                    ..
                }) if operations.is_empty() => None,
                Some(batch) => Some(Changeset::with_change(state.collection.clone(), batch.change)),
                None => None,
            }
        };

        if let Some(changeset) = pending {
            debug!(
                reset = changeset.is_reset(),
                operations = changeset.operations().len(),
                "batch committed"
            );
            self.inner.source.emit(changeset);
        }
    }
}

impl<T> ObservableCollection<Vec<T>>
where
    T: Clone + Send + 'static,
{
    pub fn len(&self) -> usize {
        self.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.with(Vec::is_empty)
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.with(|items| items.get(index).cloned())
    }

    pub fn push(&self, element: T) {
        fatal(self.commit(|items| {
            let at = items.len();
            items.push(element.clone());
            Ok(((), Change::Operations(vec![Operation::Insert { at, element }])))
        }))
    }

    pub fn try_pop(&self) -> Result<T, PatchError> {
        self.commit(|items| {
            let element = items.pop().ok_or(PatchError::EmptyCollection)?;
            let at = items.len();
            Ok((element, Change::Operations(vec![Operation::Delete { at }])))
        })
    }

    /// Remove and return the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn pop(&self) -> T {
        fatal(self.try_pop())
    }

    /// Append all `elements`, emitting one changeset.
    pub fn extend<I>(&self, elements: I)
    where
        I: IntoIterator<Item = T>,
    {
        let elements: Vec<T> = elements.into_iter().collect();
        fatal(self.commit(|items| {
            let start = items.len();
            items.extend(elements.iter().cloned());
            let operations = elements
                .into_iter()
                .enumerate()
                .map(|(offset, element)| Operation::Insert {
                    at: start + offset,
                    element,
                })
                .collect();
            Ok(((), Change::Operations(operations)))
        }))
    }

    /// Remove every element, emitting one delete per element.
    pub fn remove_all(&self) {
        fatal(self.commit(|items| {
            let operations = (0..items.len()).rev().map(|at| Operation::Delete { at }).collect();
            items.clear();
            Ok(((), Change::Operations(operations)))
        }))
    }
}

impl<T> ObservableCollection<TreeArray<T>>
where
    T: Clone + Send + 'static,
{
    /// A copy of the node at `path`, subtree included.
    pub fn node(&self, path: &IndexPath) -> Option<TreeNode<T>> {
        self.with(|tree| tree.node(path).cloned())
    }

    /// Number of nodes in the forest.
    pub fn node_count(&self) -> usize {
        self.with(|tree| tree.node_count())
    }
}

impl<C: Patchable> Clone for ObservableCollection<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Observable for ObservableCollection<C>
where
    C: Patchable + Clone + Send + 'static,
    C::Element: Send,
    C::Index: Send,
{
    type Item = Changeset<C>;

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Changeset<C>) + Send + Sync + 'static,
    {
        ObservableCollection::subscribe(self, callback)
    }

    /// Every subscriber is first handed one reset.
    fn replay_length(&self) -> usize {
        1
    }
}

impl<C> fmt::Debug for ObservableCollection<C>
where
    C: Patchable + Clone + Send + fmt::Debug + 'static,
    C::Element: Send,
    C::Index: Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ObservableCollection")
            .field("collection", &state.collection)
            .field("batching", &state.batch.is_some())
            .field("subscriber_count", &self.inner.source.subscriber_count())
            .finish()
    }
}
