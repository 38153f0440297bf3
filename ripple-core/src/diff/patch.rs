//! Patch Application Protocol
//!
//! Turns a [`Diff`] into a list of value-carrying [`Operation`]s that can be
//! applied one after another to a live collection without any index going
//! stale.
//!
//! # Order
//!
//! 1. Deletes, highest index first. Removing from the back never shifts an
//!    index that is still to be removed.
//! 2. Inserts, lowest index first. Each insert only shifts what comes after
//!    it, and everything before it is already in its final place.
//! 3. Updates. They do not shift anything.
//! 4. Moves, in script order, each a removal followed by a reinsertion.
//!
//! For tree paths "highest" and "lowest" follow the lexicographic order of
//! [`IndexPath`], so descendants are deleted before their ancestors' earlier
//! siblings and parents are inserted before their children.
//!
//! An operation addressing an index the collection does not have is a
//! programming error: [`Patchable::apply`] panics, [`Patchable::try_apply`]
//! reports a [`PatchError`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::edit::{Diff, Edit};
use super::index_path::IndexPath;
use super::sequence;
use super::tree::{self, Tree, TreeArray, TreeNode};
use crate::error::{fatal, PatchError};

/// A single mutation, carrying the element it writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation<T, I> {
    Insert { at: I, element: T },
    Delete { at: I },
    Update { at: I, element: T },
    Move { from: I, to: I },
}

impl<T, I> Operation<T, I> {
    /// The same operation without its payload.
    pub fn edit(&self) -> Edit<I>
    where
        I: Clone,
    {
        match self {
            Operation::Insert { at, .. } => Edit::Insert(at.clone()),
            Operation::Delete { at } => Edit::Delete(at.clone()),
            Operation::Update { at, .. } => Edit::Update(at.clone()),
            Operation::Move { from, to } => Edit::Move {
                from: from.clone(),
                to: to.clone(),
            },
        }
    }

    pub fn map_element<U, F>(self, transform: F) -> Operation<U, I>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Operation::Insert { at, element } => Operation::Insert {
                at,
                element: transform(element),
            },
            Operation::Delete { at } => Operation::Delete { at },
            Operation::Update { at, element } => Operation::Update {
                at,
                element: transform(element),
            },
            Operation::Move { from, to } => Operation::Move { from, to },
        }
    }

    pub fn map_index<J, F>(self, mut transform: F) -> Operation<T, J>
    where
        F: FnMut(I) -> J,
    {
        match self {
            Operation::Insert { at, element } => Operation::Insert {
                at: transform(at),
                element,
            },
            Operation::Delete { at } => Operation::Delete { at: transform(at) },
            Operation::Update { at, element } => Operation::Update {
                at: transform(at),
                element,
            },
            Operation::Move { from, to } => Operation::Move {
                from: transform(from),
                to: transform(to),
            },
        }
    }
}

/// A collection that can be mutated by index.
pub trait Patchable {
    type Index: Ord + Clone + Debug;
    type Element: Clone;

    fn try_element(&self, index: &Self::Index) -> Result<&Self::Element, PatchError>;

    fn try_insert(&mut self, index: &Self::Index, element: Self::Element) -> Result<(), PatchError>;

    fn try_remove(&mut self, index: &Self::Index) -> Result<Self::Element, PatchError>;

    /// Replace the element at `index`, returning the old one.
    fn try_replace(
        &mut self,
        index: &Self::Index,
        element: Self::Element,
    ) -> Result<Self::Element, PatchError>;

    fn try_apply_operation(
        &mut self,
        operation: Operation<Self::Element, Self::Index>,
    ) -> Result<(), PatchError> {
        match operation {
            Operation::Insert { at, element } => self.try_insert(&at, element),
            Operation::Delete { at } => self.try_remove(&at).map(drop),
            Operation::Update { at, element } => self.try_replace(&at, element).map(drop),
            Operation::Move { from, to } => {
                let element = self.try_remove(&from)?;
                self.try_insert(&to, element)
            }
        }
    }

    /// Apply `operations` in order, stopping at the first failure.
    ///
    /// Operations before the failing one stay applied.
    fn try_apply<O>(&mut self, operations: O) -> Result<(), PatchError>
    where
        O: IntoIterator<Item = Operation<Self::Element, Self::Index>>,
    {
        for operation in operations {
            self.try_apply_operation(operation)?;
        }
        Ok(())
    }

    /// Apply `operations` in order.
    ///
    /// # Panics
    ///
    /// Panics if an operation addresses an index the collection does not
    /// have at the moment it is applied.
    #[track_caller]
    fn apply<O>(&mut self, operations: O)
    where
        O: IntoIterator<Item = Operation<Self::Element, Self::Index>>,
    {
        fatal(self.try_apply(operations))
    }
}

/// A [`Patchable`] collection that can compute a diff against another.
pub trait Diffable: Patchable {
    /// Edit script turning `self` into `destination`.
    fn diff_by<E>(&self, destination: &Self, equals: E) -> Diff<Self::Index>
    where
        E: FnMut(&Self::Element, &Self::Element) -> bool;
}

impl<T: Clone> Patchable for Vec<T> {
    type Index = usize;
    type Element = T;

    fn try_element(&self, index: &usize) -> Result<&T, PatchError> {
        self.get(*index).ok_or(PatchError::IndexOutOfRange {
            index: *index,
            len: self.len(),
        })
    }

    fn try_insert(&mut self, index: &usize, element: T) -> Result<(), PatchError> {
        if *index > self.len() {
            return Err(PatchError::IndexOutOfRange {
                index: *index,
                len: self.len(),
            });
        }
        self.insert(*index, element);
        Ok(())
    }

    fn try_remove(&mut self, index: &usize) -> Result<T, PatchError> {
        if *index >= self.len() {
            return Err(PatchError::IndexOutOfRange {
                index: *index,
                len: self.len(),
            });
        }
        Ok(self.remove(*index))
    }

    fn try_replace(&mut self, index: &usize, element: T) -> Result<T, PatchError> {
        let len = self.len();
        match self.get_mut(*index) {
            Some(slot) => Ok(std::mem::replace(slot, element)),
            None => Err(PatchError::IndexOutOfRange { index: *index, len }),
        }
    }
}

impl<T: Clone> Diffable for Vec<T> {
    fn diff_by<E>(&self, destination: &Self, equals: E) -> Diff<usize>
    where
        E: FnMut(&T, &T) -> bool,
    {
        sequence::diff_by(self, destination, equals)
    }
}

fn path_error(path: &IndexPath) -> PatchError {
    if path.is_empty() {
        PatchError::EmptyPath
    } else {
        PatchError::PathOutOfRange { path: path.clone() }
    }
}

/// The empty path addresses the node itself: it can be read and replaced,
/// but not inserted or removed.
impl<T: Clone> Patchable for TreeNode<T> {
    type Index = IndexPath;
    type Element = TreeNode<T>;

    fn try_element(&self, path: &IndexPath) -> Result<&TreeNode<T>, PatchError> {
        if path.is_empty() {
            return Ok(self);
        }
        self.node(path).ok_or_else(|| path_error(path))
    }

    fn try_insert(&mut self, path: &IndexPath, node: TreeNode<T>) -> Result<(), PatchError> {
        self.insert_node(path, node)
    }

    fn try_remove(&mut self, path: &IndexPath) -> Result<TreeNode<T>, PatchError> {
        self.remove_node(path)
    }

    fn try_replace(
        &mut self,
        path: &IndexPath,
        node: TreeNode<T>,
    ) -> Result<TreeNode<T>, PatchError> {
        if path.is_empty() {
            return Ok(std::mem::replace(self, node));
        }
        self.replace_node(path, node)
    }
}

impl<T: Clone> Diffable for TreeNode<T> {
    fn diff_by<E>(&self, destination: &Self, equals: E) -> Diff<IndexPath>
    where
        E: FnMut(&TreeNode<T>, &TreeNode<T>) -> bool,
    {
        tree::diff_tree_by(self, destination, equals)
    }
}

impl<T: Clone> Patchable for TreeArray<T> {
    type Index = IndexPath;
    type Element = TreeNode<T>;

    fn try_element(&self, path: &IndexPath) -> Result<&TreeNode<T>, PatchError> {
        self.node(path).ok_or_else(|| path_error(path))
    }

    fn try_insert(&mut self, path: &IndexPath, node: TreeNode<T>) -> Result<(), PatchError> {
        self.insert_node(path, node)
    }

    fn try_remove(&mut self, path: &IndexPath) -> Result<TreeNode<T>, PatchError> {
        self.remove_node(path)
    }

    fn try_replace(
        &mut self,
        path: &IndexPath,
        node: TreeNode<T>,
    ) -> Result<TreeNode<T>, PatchError> {
        self.replace_node(path, node)
    }
}

impl<T: Clone> Diffable for TreeArray<T> {
    fn diff_by<E>(&self, destination: &Self, equals: E) -> Diff<IndexPath>
    where
        E: FnMut(&TreeNode<T>, &TreeNode<T>) -> bool,
    {
        tree::diff_tree_by(self, destination, equals)
    }
}

impl<I: Ord + Clone> Diff<I> {
    /// Order this diff for application, pulling inserted and updated
    /// elements from `destination`.
    pub fn try_patch<C>(&self, destination: &C) -> Result<Vec<Operation<C::Element, I>>, PatchError>
    where
        C: Patchable<Index = I> + ?Sized,
    {
        let mut deletes: Vec<&I> = self.deletes().collect();
        deletes.sort_unstable();
        deletes.dedup();

        let mut inserts: Vec<&I> = self.inserts().collect();
        inserts.sort_unstable();
        inserts.dedup();

        let mut operations = Vec::with_capacity(self.len());
        for at in deletes.into_iter().rev() {
            operations.push(Operation::Delete { at: at.clone() });
        }
        for at in inserts {
            operations.push(Operation::Insert {
                at: at.clone(),
                element: destination.try_element(at)?.clone(),
            });
        }
        for at in self.updates() {
            operations.push(Operation::Update {
                at: at.clone(),
                element: destination.try_element(at)?.clone(),
            });
        }
        for (from, to) in self.moves() {
            operations.push(Operation::Move {
                from: from.clone(),
                to: to.clone(),
            });
        }

        trace!(edits = self.len(), operations = operations.len(), "patch ordered");
        Ok(operations)
    }

    /// [`Diff::try_patch`], panicking if an element is missing from
    /// `destination`.
    #[track_caller]
    pub fn patch<C>(&self, destination: &C) -> Vec<Operation<C::Element, I>>
    where
        C: Patchable<Index = I> + ?Sized,
    {
        fatal(self.try_patch(destination))
    }
}

/// Apply `diff` to `target`, taking new elements from `destination`.
pub fn try_apply_diff<C>(
    diff: &Diff<C::Index>,
    target: &mut C,
    destination: &C,
) -> Result<(), PatchError>
where
    C: Patchable + ?Sized,
{
    let operations = diff.try_patch(destination)?;
    target.try_apply(operations)
}

/// Apply `diff` to `target`, taking new elements from `destination`.
///
/// # Panics
///
/// Panics if an index is out of range, see [`Patchable::apply`].
#[track_caller]
pub fn apply_diff<C>(diff: &Diff<C::Index>, target: &mut C, destination: &C)
where
    C: Patchable + ?Sized,
{
    fatal(try_apply_diff(diff, target, destination))
}
