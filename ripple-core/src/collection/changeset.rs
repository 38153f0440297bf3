//! Ordered-Collection Changesets
//!
//! A [`Changeset`] is what an observable collection emits: the collection as
//! it is after a mutation, plus a [`Change`] describing how a consumer holding
//! the previous state gets there.
//!
//! # Index spaces
//!
//! The operations of a change are a patch: each index is valid in the state
//! left behind by the operations before it. That is what makes
//! [`Changeset::merge`] a plain concatenation.
//!
//! [`Changeset::diff`] squashes the patch into a [`Diff`] whose deletes
//! address the previous collection and whose inserts and updates address
//! this one, so it can be handed to [`apply_diff`](crate::diff::apply_diff).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::{Diff, Diffable, Operation, Patchable, Squash, TreeArray};
use crate::error::{fatal, PatchError};

/// How a changeset's collection differs from the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change<T, I> {
    /// The whole collection was replaced; consumers should reload.
    Reset,

    /// Replay these operations, in order.
    Operations(Vec<Operation<T, I>>),
}

impl<T, I> Change<T, I> {
    /// `self` followed by `next`. A reset on either side absorbs the other.
    pub fn merge(self, next: Change<T, I>) -> Change<T, I> {
        match (self, next) {
            (Change::Operations(mut operations), Change::Operations(next)) => {
                operations.extend(next);
                Change::Operations(operations)
            }
            _ => Change::Reset,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Change::Reset)
    }
}

impl<T, I> Default for Change<T, I> {
    fn default() -> Self {
        Change::Operations(Vec::new())
    }
}

/// A collection snapshot and the change that produced it.
pub struct Changeset<C: Patchable> {
    collection: C,
    change: Change<C::Element, C::Index>,
}

impl<C: Patchable> Changeset<C> {
    /// A changeset telling consumers to reload `collection` entirely.
    pub fn reset(collection: C) -> Self {
        Self {
            collection,
            change: Change::Reset,
        }
    }

    /// `collection` reached by applying `operations` to the previous state.
    pub fn new(collection: C, operations: Vec<Operation<C::Element, C::Index>>) -> Self {
        Self {
            collection,
            change: Change::Operations(operations),
        }
    }

    pub fn with_change(collection: C, change: Change<C::Element, C::Index>) -> Self {
        Self { collection, change }
    }

    /// Changeset for an engine diff ending at `collection`.
    ///
    /// # Panics
    ///
    /// Panics if the diff inserts or updates an index `collection` lacks.
    #[track_caller]
    pub fn from_diff(collection: C, diff: &Diff<C::Index>) -> Self {
        fatal(Self::try_from_diff(collection, diff))
    }

    pub fn try_from_diff(collection: C, diff: &Diff<C::Index>) -> Result<Self, PatchError> {
        let operations = diff.try_patch(&collection)?;
        Ok(Self::new(collection, operations))
    }

    /// Diff `previous` against `collection` and package the result.
    pub fn between<E>(previous: &C, collection: C, equals: E) -> Self
    where
        C: Diffable,
        E: FnMut(&C::Element, &C::Element) -> bool,
    {
        let diff = previous.diff_by(&collection, equals);
        Self::from_diff(collection, &diff)
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn into_collection(self) -> C {
        self.collection
    }

    pub fn change(&self) -> &Change<C::Element, C::Index> {
        &self.change
    }

    /// The operations to replay. Empty for a reset.
    pub fn operations(&self) -> &[Operation<C::Element, C::Index>] {
        match &self.change {
            Change::Reset => &[],
            Change::Operations(operations) => operations,
        }
    }

    pub fn is_reset(&self) -> bool {
        self.change.is_reset()
    }

    /// Whether the collection is unchanged. A reset never counts as empty.
    pub fn is_empty(&self) -> bool {
        match &self.change {
            Change::Reset => false,
            Change::Operations(operations) => operations.is_empty(),
        }
    }

    /// `self` followed by `next`, as one changeset ending at `next`'s
    /// collection.
    pub fn merge(self, next: Changeset<C>) -> Changeset<C> {
        Changeset {
            collection: next.collection,
            change: self.change.merge(next.change),
        }
    }

    /// The diff from the previous collection to this one, or `None` for a
    /// reset.
    pub fn diff(&self) -> Option<Diff<C::Index>>
    where
        C: Squash,
    {
        match &self.change {
            Change::Reset => None,
            Change::Operations(operations) => Some(self.collection.squash(operations)),
        }
    }

    /// A reset to this changeset's collection.
    pub fn to_reset(&self) -> Self
    where
        C: Clone,
    {
        Self::reset(self.collection.clone())
    }

    /// Bring `target`, a copy of the previous state, up to date.
    ///
    /// A reset overwrites it with a clone of the collection.
    pub fn try_apply_to(&self, target: &mut C) -> Result<(), PatchError>
    where
        C: Clone,
    {
        match &self.change {
            Change::Reset => {
                target.clone_from(&self.collection);
                Ok(())
            }
            Change::Operations(operations) => target.try_apply(operations.iter().cloned()),
        }
    }

    #[track_caller]
    pub fn apply_to(&self, target: &mut C)
    where
        C: Clone,
    {
        fatal(self.try_apply_to(target))
    }
}

impl<T: Clone> Changeset<Vec<T>> {
    /// Transform every element, in the collection and in the operations.
    /// Indices are untouched.
    pub fn map<U, F>(self, mut transform: F) -> Changeset<Vec<U>>
    where
        U: Clone,
        F: FnMut(T) -> U,
    {
        let change = match self.change {
            Change::Reset => Change::Reset,
            Change::Operations(operations) => Change::Operations(
                operations
                    .into_iter()
                    .map(|operation| operation.map_element(&mut transform))
                    .collect(),
            ),
        };
        Changeset {
            collection: self.collection.into_iter().map(&mut transform).collect(),
            change,
        }
    }
}

impl<T: Clone> Changeset<TreeArray<T>> {
    /// Transform every node value, in the tree and in the operations.
    /// Paths are untouched.
    pub fn map<U, F>(self, mut transform: F) -> Changeset<TreeArray<U>>
    where
        U: Clone,
        F: FnMut(T) -> U,
    {
        let change = match self.change {
            Change::Reset => Change::Reset,
            Change::Operations(operations) => Change::Operations(
                operations
                    .into_iter()
                    .map(|operation| operation.map_element(|node| node.map(&mut transform)))
                    .collect(),
            ),
        };
        Changeset {
            collection: self.collection.map(&mut transform),
            change,
        }
    }
}

impl<C> Clone for Changeset<C>
where
    C: Patchable + Clone,
{
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            change: self.change.clone(),
        }
    }
}

impl<C> PartialEq for Changeset<C>
where
    C: Patchable + PartialEq,
    C::Element: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.collection == other.collection && self.change == other.change
    }
}

impl<C> fmt::Debug for Changeset<C>
where
    C: Patchable + fmt::Debug,
    C::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Changeset")
            .field("collection", &self.collection)
            .field("change", &self.change)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Edit, IndexPath, TreeNode};

    #[test]
    fn between_identical_collections_is_empty() {
        let changeset = Changeset::between(&vec![1, 2, 3], vec![1, 2, 3], |a, b| a == b);
        assert!(changeset.is_empty());
        assert!(!changeset.is_reset());
    }

    #[test]
    fn between_pulls_elements_from_new_collection() {
        let changeset =
            Changeset::between(&vec!["a", "b", "c"], vec!["a", "c", "d"], |a, b| a == b);
        assert_eq!(
            changeset.operations(),
            &[
                Operation::Delete { at: 1 },
                Operation::Insert { at: 2, element: "d" },
            ]
        );
        assert_eq!(
            changeset.diff().map(Diff::into_edits),
            Some(vec![Edit::Delete(1), Edit::Insert(2)])
        );
    }

    #[test]
    fn merge_concatenates_and_keeps_last_collection() {
        let first = Changeset::new(vec![0, 1], vec![Operation::Insert { at: 1, element: 1 }]);
        let second = Changeset::new(vec![1], vec![Operation::Delete { at: 0 }]);

        let merged = first.merge(second);
        assert_eq!(merged.collection(), &vec![1]);
        assert_eq!(
            merged.operations(),
            &[Operation::Insert { at: 1, element: 1 }, Operation::Delete { at: 0 }]
        );

        let mut view = vec![0];
        merged.apply_to(&mut view);
        assert_eq!(view, vec![1]);
    }

    #[test]
    fn merge_with_reset_is_reset() {
        let reset = Changeset::reset(vec![5]);
        let ops = Changeset::new(vec![5, 6], vec![Operation::Insert { at: 1, element: 6 }]);

        let merged = reset.clone().merge(ops.clone());
        assert!(merged.is_reset());
        assert_eq!(merged.collection(), &vec![5, 6]);

        assert!(ops.merge(reset).is_reset());
    }

    #[test]
    fn reset_overwrites_target() {
        let mut view = vec![9, 9, 9];
        Changeset::reset(vec![1]).apply_to(&mut view);
        assert_eq!(view, vec![1]);
        assert!(Changeset::reset(vec![1]).operations().is_empty());
        assert_eq!(Changeset::reset(vec![1]).diff(), None);
    }

    #[test]
    fn map_preserves_indices() {
        let changeset = Changeset::new(
            vec![10, 20],
            vec![
                Operation::Update { at: 0, element: 10 },
                Operation::Move { from: 0, to: 1 },
            ],
        );
        let mapped = changeset.map(|v| v.to_string());

        assert_eq!(mapped.collection(), &vec!["10".to_string(), "20".to_string()]);
        assert_eq!(
            mapped.operations(),
            &[
                Operation::Update { at: 0, element: "10".to_string() },
                Operation::Move { from: 0, to: 1 },
            ]
        );
    }

    #[test]
    fn tree_changeset_round_trip() {
        let previous =
            TreeArray::new(vec![TreeNode::with_children("s0", vec![TreeNode::new("r0")])]);
        let next = TreeArray::new(vec![
            TreeNode::with_children("s0", vec![TreeNode::new("r0"), TreeNode::new("r1")]),
            TreeNode::new("s1"),
        ]);

        let changeset = Changeset::between(&previous, next.clone(), |a, b| a.value == b.value);
        // Parents before their new children.
        assert_eq!(
            changeset.diff().map(Diff::into_edits),
            Some(vec![Edit::Insert(IndexPath::from([0, 1])), Edit::Insert(IndexPath::from([1]))])
        );

        let mut view = previous;
        changeset.apply_to(&mut view);
        assert_eq!(view, next);

        let lengths = changeset.map(str::len);
        assert_eq!(lengths.collection().children[1].value, 2);
    }

    #[test]
    fn merged_diff_addresses_previous_and_current_state() {
        let previous = vec!['a', 'b', 'c'];
        let first = Changeset::new(
            vec!['z', 'a', 'b', 'c'],
            vec![Operation::Insert { at: 0, element: 'z' }],
        );
        let second = Changeset::new(vec!['z', 'a', 'c'], vec![Operation::Delete { at: 2 }]);
        let merged = first.merge(second);

        let diff = merged.diff().unwrap();
        assert_eq!(diff.clone().into_edits(), vec![Edit::Delete(1), Edit::Insert(0)]);

        let mut view = previous;
        crate::diff::apply_diff(&diff, &mut view, merged.collection());
        assert_eq!(view, vec!['z', 'a', 'c']);
    }

    #[test]
    fn to_reset_keeps_collection() {
        let changeset = Changeset::new(vec![1, 2], vec![Operation::Insert { at: 1, element: 2 }]);
        let reset = changeset.to_reset();
        assert!(reset.is_reset());
        assert_eq!(reset.collection(), &vec![1, 2]);
    }

    #[test]
    fn change_serializes_by_kind() {
        let change: Change<i32, usize> = Change::Operations(vec![Operation::Delete { at: 3 }]);
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"operations":[{"delete":{"at":3}}]}"#);
        assert_eq!(serde_json::to_string(&Change::<i32, usize>::Reset).unwrap(), r#""reset""#);
    }
}
