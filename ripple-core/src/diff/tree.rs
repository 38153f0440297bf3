//! Tree Structures and Tree Diff
//!
//! A tree is anything that owns an ordered list of child nodes, where every
//! node is itself a tree of the same node type. Nodes are addressed with
//! [`IndexPath`]s relative to the tree they are looked up in; the empty path
//! addresses the tree itself and has no node of its own.
//!
//! # Diffing
//!
//! [`diff_tree_by`] diffs level by level:
//!
//! 1. The direct children are diffed with the sequence engine.
//! 2. Every matched pair is diffed recursively, its paths prefixed with the
//!    pair's source and destination paths.
//! 3. All edits end up in one composite [`Diff`].
//!
//! Inserted and deleted subtrees are reported as a single edit at their own
//! path; the engine never descends into them.

use serde::{Deserialize, Serialize};

use super::edit::{Diff, Edit};
use super::index_path::IndexPath;
use super::sequence::{traces_by, Trace};
use crate::error::PatchError;

/// An ordered, recursively nested collection.
pub trait Tree {
    type Node: Tree<Node = Self::Node>;

    fn children(&self) -> &[Self::Node];

    fn children_mut(&mut self) -> &mut Vec<Self::Node>;

    /// Node at `path`, or `None` if the path is empty or leads nowhere.
    fn node(&self, path: &IndexPath) -> Option<&Self::Node> {
        let (first, rest) = path.as_slice().split_first()?;
        let mut node = self.children().get(*first)?;
        for index in rest {
            node = node.children().get(*index)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, path: &IndexPath) -> Option<&mut Self::Node> {
        let (first, rest) = path.as_slice().split_first()?;
        let mut node = self.children_mut().get_mut(*first)?;
        for index in rest {
            node = node.children_mut().get_mut(*index)?;
        }
        Some(node)
    }

    /// Insert `node` so that it ends up at `path`.
    fn insert_node(&mut self, path: &IndexPath, node: Self::Node) -> Result<(), PatchError> {
        let (index, siblings) = siblings_mut(self, path)?;
        if index > siblings.len() {
            return Err(PatchError::PathOutOfRange { path: path.clone() });
        }
        siblings.insert(index, node);
        Ok(())
    }

    /// Remove and return the node at `path`, subtree included.
    fn remove_node(&mut self, path: &IndexPath) -> Result<Self::Node, PatchError> {
        let (index, siblings) = siblings_mut(self, path)?;
        if index >= siblings.len() {
            return Err(PatchError::PathOutOfRange { path: path.clone() });
        }
        Ok(siblings.remove(index))
    }

    /// Replace the node at `path`, returning the old one.
    fn replace_node(
        &mut self,
        path: &IndexPath,
        node: Self::Node,
    ) -> Result<Self::Node, PatchError> {
        match self.node_mut(path) {
            Some(slot) => Ok(std::mem::replace(slot, node)),
            None if path.is_empty() => Err(PatchError::EmptyPath),
            None => Err(PatchError::PathOutOfRange { path: path.clone() }),
        }
    }

    /// Number of nodes below the root.
    fn node_count(&self) -> usize {
        self.children().iter().map(|child| 1 + child.node_count()).sum()
    }

    /// Paths of all nodes below the root, depth-first, parents first.
    fn paths(&self) -> Vec<IndexPath> {
        let mut paths = Vec::with_capacity(self.node_count());
        collect_paths(self.children(), &IndexPath::root(), &mut paths);
        paths
    }
}

fn siblings_mut<'a, R>(
    tree: &'a mut R,
    path: &IndexPath,
) -> Result<(usize, &'a mut Vec<R::Node>), PatchError>
where
    R: Tree + ?Sized,
{
    let (index, parent) = path.as_slice().split_last().ok_or(PatchError::EmptyPath)?;
    let mut siblings = tree.children_mut();
    for level in parent {
        siblings = match siblings.get_mut(*level) {
            Some(node) => node.children_mut(),
            None => return Err(PatchError::PathOutOfRange { path: path.clone() }),
        };
    }
    Ok((*index, siblings))
}

fn collect_paths<N: Tree<Node = N>>(nodes: &[N], prefix: &IndexPath, paths: &mut Vec<IndexPath>) {
    for (index, node) in nodes.iter().enumerate() {
        let path = prefix.appending(index);
        paths.push(path.clone());
        collect_paths(node.children(), &path, paths);
    }
}

/// A tree node carrying a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeNode<T> {
    pub value: T,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// A leaf.
    pub fn new(value: T) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }

    pub fn with_children(value: T, children: Vec<TreeNode<T>>) -> Self {
        Self { value, children }
    }

    /// Transform every value in the subtree, keeping its shape.
    pub fn map<U, F>(self, mut transform: F) -> TreeNode<U>
    where
        F: FnMut(T) -> U,
    {
        self.map_with(&mut transform)
    }

    fn map_with<U, F>(self, transform: &mut F) -> TreeNode<U>
    where
        F: FnMut(T) -> U,
    {
        TreeNode {
            value: transform(self.value),
            children: self
                .children
                .into_iter()
                .map(|child| child.map_with(transform))
                .collect(),
        }
    }
}

impl<T> Tree for TreeNode<T> {
    type Node = TreeNode<T>;

    fn children(&self) -> &[TreeNode<T>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<TreeNode<T>> {
        &mut self.children
    }
}

/// A forest: a value-less root holding a list of trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeArray<T> {
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeArray<T> {
    pub fn new(children: Vec<TreeNode<T>>) -> Self {
        Self { children }
    }

    pub fn map<U, F>(self, mut transform: F) -> TreeArray<U>
    where
        F: FnMut(T) -> U,
    {
        TreeArray {
            children: self
                .children
                .into_iter()
                .map(|child| child.map_with(&mut transform))
                .collect(),
        }
    }
}

impl<T> Default for TreeArray<T> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
        }
    }
}

impl<T> From<Vec<TreeNode<T>>> for TreeArray<T> {
    fn from(children: Vec<TreeNode<T>>) -> Self {
        Self::new(children)
    }
}

impl<T> Tree for TreeArray<T> {
    type Node = TreeNode<T>;

    fn children(&self) -> &[TreeNode<T>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<TreeNode<T>> {
        &mut self.children
    }
}

/// Edit script turning `source` into `destination`, comparing nodes with
/// `equals`.
///
/// Deletes carry source paths, inserts destination paths.
pub fn diff_tree_by<R, E>(source: &R, destination: &R, mut equals: E) -> Diff<IndexPath>
where
    R: Tree + ?Sized,
    E: FnMut(&R::Node, &R::Node) -> bool,
{
    let mut diff = Diff::new();
    diff_children(
        source.children(),
        destination.children(),
        &IndexPath::root(),
        &IndexPath::root(),
        &mut equals,
        &mut diff,
    );
    diff
}

/// [`diff_tree_by`] comparing node values.
pub fn diff_tree<R, T>(source: &R, destination: &R) -> Diff<IndexPath>
where
    R: Tree<Node = TreeNode<T>> + ?Sized,
    T: PartialEq,
{
    diff_tree_by(source, destination, |a, b| a.value == b.value)
}

fn diff_children<N, E>(
    source: &[N],
    destination: &[N],
    source_root: &IndexPath,
    destination_root: &IndexPath,
    equals: &mut E,
    diff: &mut Diff<IndexPath>,
) where
    N: Tree<Node = N>,
    E: FnMut(&N, &N) -> bool,
{
    let traces = traces_by(source, destination, &mut *equals);

    for trace in &traces {
        match *trace {
            Trace::Insert { destination } => {
                diff.push(Edit::Insert(destination_root.appending(destination)))
            }
            Trace::Delete { source } => diff.push(Edit::Delete(source_root.appending(source))),
            Trace::Match { .. } => {}
        }
    }

    for trace in traces {
        if let Trace::Match {
            source: x,
            destination: y,
        } = trace
        {
            diff_children(
                source[x].children(),
                destination[y].children(),
                &source_root.appending(x),
                &destination_root.appending(y),
                equals,
                diff,
            );
        }
    }
}
