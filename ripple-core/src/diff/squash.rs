//! Patch Squashing
//!
//! A patch is a list of [`Operation`]s applied one after another, each index
//! valid in the state the previous operation left behind. [`Squash`] turns a
//! patch back into a [`Diff`] from the state before it to the state after
//! it, in the index spaces [`Diff::patch`] consumes: deletes address the
//! source, inserts and updates address the destination.
//!
//! # How It Works
//!
//! The destination's layout is rebuilt as a tree of slots, each remembering
//! its destination path. The patch is then undone from its last operation to
//! its first:
//!
//! - an undone insert removes its slot;
//! - an undone delete puts back a placeholder for the lost element;
//! - an undone update marks the slot as overwritten;
//! - an undone move carries the slot back and marks it as moved.
//!
//! What remains has the layout of the source. Walking it yields the deletes
//! and updates; destination nodes whose slot did not survive are inserts.
//!
//! Overwritten and moved slots are opaque. Operations below them only shape
//! content that the final update or insert brings along anyway, so they are
//! skipped. A moved element is reported as a delete plus an insert.

use std::collections::BTreeSet;

use super::edit::{Diff, Edit};
use super::index_path::IndexPath;
use super::patch::{Operation, Patchable};
use super::tree::{Tree, TreeArray, TreeNode};

/// A collection that can recover the diff a patch made to it.
pub trait Squash: Patchable {
    /// Diff from the state before `patch` to `self`, the state after it.
    ///
    /// The result is only meaningful if applying `patch` produced `self`.
    fn squash(&self, patch: &[Operation<Self::Element, Self::Index>]) -> Diff<Self::Index>;
}

#[derive(Debug, Clone)]
enum Slot {
    /// Present before and after, changed at most through its children.
    Kept {
        destination: IndexPath,
        children: Vec<Slot>,
    },
    /// Present before and after, subtree overwritten.
    Updated { destination: IndexPath },
    /// Taken out of this position and reinserted at `destination`.
    Moved { destination: IndexPath },
    /// Removed by the patch.
    Deleted,
}

impl Slot {
    fn root(children: Vec<Slot>) -> Slot {
        Slot::Kept {
            destination: IndexPath::root(),
            children,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Slot>> {
        match self {
            Slot::Kept { children, .. } => Some(children),
            _ => None,
        }
    }

    fn updated(self) -> Slot {
        match self {
            Slot::Kept { destination, .. } => Slot::Updated { destination },
            other => other,
        }
    }

    fn moved(self) -> Slot {
        match self {
            Slot::Kept { destination, .. } | Slot::Updated { destination } => {
                Slot::Moved { destination }
            }
            other => other,
        }
    }
}

fn layout<N: Tree<Node = N>>(nodes: &[N], parent: &IndexPath) -> Vec<Slot> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let destination = parent.appending(index);
            let children = layout(node.children(), &destination);
            Slot::Kept {
                destination,
                children,
            }
        })
        .collect()
}

/// The slot at `path`, or `None` if the path runs through an opaque slot.
fn slot_mut<'a>(root: &'a mut Slot, path: &IndexPath) -> Option<&'a mut Slot> {
    let mut slot = root;
    for index in path {
        slot = slot.children_mut()?.get_mut(*index)?;
    }
    Some(slot)
}

fn siblings_mut<'a>(root: &'a mut Slot, path: &IndexPath) -> Option<(usize, &'a mut Vec<Slot>)> {
    let index = path.last()?;
    let parent = slot_mut(root, &path.dropping_last())?;
    Some((index, parent.children_mut()?))
}

fn take(root: &mut Slot, path: &IndexPath) -> Option<Slot> {
    let (index, siblings) = siblings_mut(root, path)?;
    (index < siblings.len()).then(|| siblings.remove(index))
}

fn put(root: &mut Slot, path: &IndexPath, slot: Slot) {
    if let Some((index, siblings)) = siblings_mut(root, path) {
        if index <= siblings.len() {
            siblings.insert(index, slot);
        }
    }
}

fn undo(root: &mut Slot, edit: &Edit<IndexPath>) {
    match edit {
        Edit::Insert(at) => {
            take(root, at);
        }
        Edit::Delete(at) => put(root, at, Slot::Deleted),
        Edit::Update(at) => {
            if let Some(slot) = slot_mut(root, at) {
                let current = std::mem::replace(slot, Slot::Deleted);
                *slot = current.updated();
            }
        }
        Edit::Move { from, to } if from == to => {}
        Edit::Move { from, to } => {
            // Landing inside an opaque slot means the element is gone.
            let slot = take(root, to).map_or(Slot::Deleted, Slot::moved);
            put(root, from, slot);
        }
    }
}

#[derive(Default)]
struct Settled {
    deletes: Vec<IndexPath>,
    updates: Vec<IndexPath>,
    kept: BTreeSet<IndexPath>,
    updated: BTreeSet<IndexPath>,
}

impl Settled {
    fn walk_source(&mut self, slot: &Slot, source: IndexPath) {
        match slot {
            Slot::Kept {
                destination,
                children,
            } => {
                self.kept.insert(destination.clone());
                for (index, child) in children.iter().enumerate() {
                    self.walk_source(child, source.appending(index));
                }
            }
            Slot::Updated { destination } => {
                self.updated.insert(destination.clone());
                self.updates.push(destination.clone());
            }
            Slot::Moved { .. } | Slot::Deleted => self.deletes.push(source),
        }
    }

    fn walk_destination(&self, children: &[Slot], inserts: &mut Vec<IndexPath>) {
        for child in children {
            if let Slot::Kept {
                destination,
                children,
            } = child
            {
                if self.kept.contains(destination) {
                    self.walk_destination(children, inserts);
                } else if !self.updated.contains(destination) {
                    inserts.push(destination.clone());
                }
            }
        }
    }
}

fn squash_edits<E>(destination: Slot, patch: E) -> Diff<IndexPath>
where
    E: DoubleEndedIterator<Item = Edit<IndexPath>>,
{
    let mut source = destination.clone();
    for edit in patch.rev() {
        undo(&mut source, &edit);
    }

    let mut settled = Settled::default();
    settled.walk_source(&source, IndexPath::root());

    let mut inserts = Vec::new();
    if let Slot::Kept { children, .. } = &destination {
        if settled.kept.contains(&IndexPath::root()) {
            settled.walk_destination(children, &mut inserts);
        }
    }

    let Settled {
        deletes, updates, ..
    } = settled;
    let edits = deletes
        .into_iter()
        .map(Edit::Delete)
        .chain(inserts.into_iter().map(Edit::Insert))
        .chain(updates.into_iter().map(Edit::Update))
        .collect();
    Diff::from_edits(edits)
}

fn squash_tree<R>(tree: &R, patch: &[Operation<R::Node, IndexPath>]) -> Diff<IndexPath>
where
    R: Tree,
{
    let destination = Slot::root(layout(tree.children(), &IndexPath::root()));
    squash_edits(destination, patch.iter().map(Operation::edit))
}

impl<T: Clone> Squash for Vec<T> {
    fn squash(&self, patch: &[Operation<T, usize>]) -> Diff<usize> {
        let leaves = (0..self.len())
            .map(|index| Slot::Kept {
                destination: IndexPath::from([index]),
                children: Vec::new(),
            })
            .collect();
        let edits = patch
            .iter()
            .map(|operation| operation.edit().map_index(|index| IndexPath::from([index])));
        squash_edits(Slot::root(leaves), edits).map_index(|path| path[0])
    }
}

impl<T: Clone> Squash for TreeArray<T> {
    fn squash(&self, patch: &[Operation<TreeNode<T>, IndexPath>]) -> Diff<IndexPath> {
        squash_tree(self, patch)
    }
}

/// An update of the empty path overwrites the whole tree and squashes to a
/// single update of the root.
impl<T: Clone> Squash for TreeNode<T> {
    fn squash(&self, patch: &[Operation<TreeNode<T>, IndexPath>]) -> Diff<IndexPath> {
        squash_tree(self, patch)
    }
}
