//! Index paths.
//!
//! An [`IndexPath`] locates a node in a tree as the sequence of child indices
//! leading to it from the root. Paths order lexicographically, so a parent
//! sorts before its descendants and siblings sort by index:
//! `[1] < [1, 0] < [1, 2] < [2]`.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Root-relative location of a tree node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexPath(SmallVec<[usize; 4]>);

impl IndexPath {
    /// The empty path, addressing the root itself.
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    pub fn new(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    /// This path extended by one child index.
    pub fn appending(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.0.push(index);
        path
    }

    /// This path without its last component. The root stays the root.
    pub fn dropping_last(&self) -> Self {
        let mut path = self.clone();
        path.0.pop();
        path
    }

    /// Path of the parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self.dropping_last())
        }
    }

    /// Index of the node within its parent's children.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }
}

impl Index<usize> for IndexPath {
    type Output = usize;

    fn index(&self, level: usize) -> &usize {
        &self.0[level]
    }
}

impl From<Vec<usize>> for IndexPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(indices))
    }
}

impl<const N: usize> From<[usize; N]> for IndexPath {
    fn from(indices: [usize; N]) -> Self {
        Self::new(&indices)
    }
}

impl From<&[usize]> for IndexPath {
    fn from(indices: &[usize]) -> Self {
        Self::new(indices)
    }
}

impl FromIterator<usize> for IndexPath {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IndexPath {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        let mut paths = vec![
            IndexPath::from([2]),
            IndexPath::from([1, 2]),
            IndexPath::from([1]),
            IndexPath::from([1, 0]),
            IndexPath::root(),
        ];
        paths.sort();

        assert_eq!(
            paths,
            vec![
                IndexPath::root(),
                IndexPath::from([1]),
                IndexPath::from([1, 0]),
                IndexPath::from([1, 2]),
                IndexPath::from([2]),
            ]
        );
    }

    #[test]
    fn append_and_drop() {
        let path = IndexPath::from([3]).appending(1).appending(4);
        assert_eq!(path, IndexPath::from([3, 1, 4]));
        assert_eq!(path.dropping_last(), IndexPath::from([3, 1]));
        assert_eq!(path.last(), Some(4));
        assert_eq!(path.parent(), Some(IndexPath::from([3, 1])));
        assert_eq!(IndexPath::root().parent(), None);
        assert_eq!(IndexPath::root().dropping_last(), IndexPath::root());
    }

    #[test]
    fn displays_as_list() {
        assert_eq!(IndexPath::from([2, 5]).to_string(), "[2, 5]");
        assert_eq!(IndexPath::root().to_string(), "[]");
        assert_eq!(format!("{:?}", IndexPath::from([0])), "[0]");
    }

    #[test]
    fn serializes_as_plain_array() {
        let json = serde_json::to_string(&IndexPath::from([1, 2])).unwrap();
        assert_eq!(json, "[1,2]");
        let path: IndexPath = serde_json::from_str("[4,0]").unwrap();
        assert_eq!(path, IndexPath::from([4, 0]));
    }
}
