//! Edit scripts.
//!
//! A [`Diff`] is an ordered list of [`Edit`]s describing how one collection
//! state turns into another. The index an edit carries lives in the state it
//! is meant to be applied in: deletes address the source collection, inserts
//! address the destination collection. The patch protocol
//! ([`Diff::patch`]) relies on exactly this split.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single valueless edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edit<I> {
    /// An element was inserted at this destination index.
    Insert(I),

    /// The element at this source index was deleted.
    Delete(I),

    /// The element at this index was replaced.
    Update(I),

    /// An element was removed from `from` and reinserted at `to`.
    Move { from: I, to: I },
}

impl<I> Edit<I> {
    pub fn map_index<J, F>(self, mut transform: F) -> Edit<J>
    where
        F: FnMut(I) -> J,
    {
        match self {
            Edit::Insert(at) => Edit::Insert(transform(at)),
            Edit::Delete(at) => Edit::Delete(transform(at)),
            Edit::Update(at) => Edit::Update(transform(at)),
            Edit::Move { from, to } => Edit::Move {
                from: transform(from),
                to: transform(to),
            },
        }
    }
}

impl<I: fmt::Display> fmt::Display for Edit<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Insert(at) => write!(f, "I({at})"),
            Edit::Delete(at) => write!(f, "D({at})"),
            Edit::Update(at) => write!(f, "U({at})"),
            Edit::Move { from, to } => write!(f, "M({from} -> {to})"),
        }
    }
}

/// An ordered edit script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff<I> {
    edits: Vec<Edit<I>>,
}

impl<I> Diff<I> {
    /// The empty diff.
    pub fn new() -> Self {
        Self { edits: Vec::new() }
    }

    pub fn from_edits(edits: Vec<Edit<I>>) -> Self {
        Self { edits }
    }

    pub fn edits(&self) -> &[Edit<I>] {
        &self.edits
    }

    pub fn into_edits(self) -> Vec<Edit<I>> {
        self.edits
    }

    /// Total number of edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn push(&mut self, edit: Edit<I>) {
        self.edits.push(edit);
    }

    /// Append the edits of `other`.
    pub fn merge(&mut self, other: Diff<I>) {
        self.edits.extend(other.edits);
    }

    /// Destination indices of inserts, in script order.
    pub fn inserts(&self) -> impl Iterator<Item = &I> + '_ {
        self.edits.iter().filter_map(|edit| match edit {
            Edit::Insert(at) => Some(at),
            _ => None,
        })
    }

    /// Source indices of deletes, in script order.
    pub fn deletes(&self) -> impl Iterator<Item = &I> + '_ {
        self.edits.iter().filter_map(|edit| match edit {
            Edit::Delete(at) => Some(at),
            _ => None,
        })
    }

    pub fn updates(&self) -> impl Iterator<Item = &I> + '_ {
        self.edits.iter().filter_map(|edit| match edit {
            Edit::Update(at) => Some(at),
            _ => None,
        })
    }

    pub fn moves(&self) -> impl Iterator<Item = (&I, &I)> + '_ {
        self.edits.iter().filter_map(|edit| match edit {
            Edit::Move { from, to } => Some((from, to)),
            _ => None,
        })
    }

    pub fn map_index<J, F>(self, mut transform: F) -> Diff<J>
    where
        F: FnMut(I) -> J,
    {
        Diff {
            edits: self
                .edits
                .into_iter()
                .map(|edit| edit.map_index(&mut transform))
                .collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edit<I>> {
        self.edits.iter()
    }
}

impl<I> Default for Diff<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> From<Vec<Edit<I>>> for Diff<I> {
    fn from(edits: Vec<Edit<I>>) -> Self {
        Self::from_edits(edits)
    }
}

impl<I> FromIterator<Edit<I>> for Diff<I> {
    fn from_iter<T: IntoIterator<Item = Edit<I>>>(iter: T) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}

impl<I> IntoIterator for Diff<I> {
    type Item = Edit<I>;
    type IntoIter = std::vec::IntoIter<Edit<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.into_iter()
    }
}

impl<'a, I> IntoIterator for &'a Diff<I> {
    type Item = &'a Edit<I>;
    type IntoIter = std::slice::Iter<'a, Edit<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

impl<I: fmt::Display> fmt::Display for Diff<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, edit) in self.edits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{edit}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Diff<usize> {
        Diff::from_edits(vec![
            Edit::Delete(1),
            Edit::Insert(2),
            Edit::Update(0),
            Edit::Move { from: 3, to: 0 },
        ])
    }

    #[test]
    fn filters_by_kind() {
        let diff = sample();
        assert_eq!(diff.inserts().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(diff.deletes().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(diff.updates().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(diff.moves().map(|(f, t)| (*f, *t)).collect::<Vec<_>>(), vec![(3, 0)]);
        assert_eq!(diff.len(), 4);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut diff = Diff::from_edits(vec![Edit::Insert(0)]);
        diff.merge(Diff::from_edits(vec![Edit::Delete(4)]));
        assert_eq!(diff.edits(), &[Edit::Insert(0), Edit::Delete(4)]);
    }

    #[test]
    fn map_index_keeps_kinds() {
        let mapped = sample().map_index(|i| i * 10);
        assert_eq!(
            mapped.into_edits(),
            vec![
                Edit::Delete(10),
                Edit::Insert(20),
                Edit::Update(0),
                Edit::Move { from: 30, to: 0 },
            ]
        );
    }

    #[test]
    fn displays_compactly() {
        assert_eq!(sample().to_string(), "[D(1), I(2), U(0), M(3 -> 0)]");
    }

    #[test]
    fn serializes_edits() {
        let json = serde_json::to_string(&Diff::from_edits(vec![Edit::Insert(1usize)])).unwrap();
        assert_eq!(json, r#"[{"insert":1}]"#);
    }
}
