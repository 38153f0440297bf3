//! Sequence Diff
//!
//! Computes an edit script between two sequences from their longest common
//! subsequence.
//!
//! # Algorithm
//!
//! 1. Fill an `(n + 1) × (m + 1)` table where `table[i][j]` is the LCS length
//!    of `source[..i]` and `destination[..j]`.
//!
//! 2. Walk back from `table[n][m]` to the origin. At each step an insert is
//!    preferred when `table[i][j] == table[i][j - 1]`, then a delete when
//!    `table[i][j] == table[i - 1][j]`; otherwise both elements match and no
//!    edit is produced. This tie-break fixes which of several minimal scripts
//!    is returned.
//!
//! 3. The walk is reversed so the script runs from the start of the
//!    sequences to the end. Inserts carry destination indices, deletes source
//!    indices.
//!
//! Time and space are `O(n · m)`: fine for view-sized lists, not meant for
//! bulk data.

use super::edit::{Diff, Edit};

/// One step of the backtrack through the LCS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    /// `source[source]` and `destination[destination]` are the same element.
    Match { source: usize, destination: usize },

    /// `destination[destination]` has no counterpart in the source.
    Insert { destination: usize },

    /// `source[source]` has no counterpart in the destination.
    Delete { source: usize },
}

/// Full backtrack path from the start of both sequences to their end,
/// matches included.
pub fn traces_by<T, E>(source: &[T], destination: &[T], mut equals: E) -> Vec<Trace>
where
    E: FnMut(&T, &T) -> bool,
{
    let rows = source.len();
    let columns = destination.len();
    let width = columns + 1;
    let at = |i: usize, j: usize| i * width + j;

    let mut table = vec![0usize; (rows + 1) * width];
    for i in 1..=rows {
        for j in 1..=columns {
            table[at(i, j)] = if equals(&source[i - 1], &destination[j - 1]) {
                table[at(i - 1, j - 1)] + 1
            } else {
                table[at(i - 1, j)].max(table[at(i, j - 1)])
            };
        }
    }

    let mut traces = Vec::with_capacity(rows.max(columns));
    let (mut i, mut j) = (rows, columns);
    while i > 0 || j > 0 {
        if i == 0 {
            j -= 1;
            traces.push(Trace::Insert { destination: j });
        } else if j == 0 {
            i -= 1;
            traces.push(Trace::Delete { source: i });
        } else if table[at(i, j)] == table[at(i, j - 1)] {
            j -= 1;
            traces.push(Trace::Insert { destination: j });
        } else if table[at(i, j)] == table[at(i - 1, j)] {
            i -= 1;
            traces.push(Trace::Delete { source: i });
        } else {
            i -= 1;
            j -= 1;
            traces.push(Trace::Match {
                source: i,
                destination: j,
            });
        }
    }

    traces.reverse();
    traces
}

/// Edit script turning `source` into `destination`, comparing elements with
/// `equals`.
///
/// `equals` must be an equivalence relation.
pub fn diff_by<T, E>(source: &[T], destination: &[T], equals: E) -> Diff<usize>
where
    E: FnMut(&T, &T) -> bool,
{
    traces_by(source, destination, equals)
        .into_iter()
        .filter_map(|trace| match trace {
            Trace::Insert { destination } => Some(Edit::Insert(destination)),
            Trace::Delete { source } => Some(Edit::Delete(source)),
            Trace::Match { .. } => None,
        })
        .collect()
}

/// [`diff_by`] using `PartialEq`.
pub fn diff<T: PartialEq>(source: &[T], destination: &[T]) -> Diff<usize> {
    diff_by(source, destination, |a, b| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_produce_empty_diff() {
        assert!(diff(&[1, 2, 3], &[1, 2, 3]).is_empty());
        assert!(diff::<i32>(&[], &[]).is_empty());
    }

    #[test]
    fn inserting_into_empty() {
        assert_eq!(
            diff(&[], &[1, 2]).into_edits(),
            vec![Edit::Insert(0), Edit::Insert(1)]
        );
    }

    #[test]
    fn deleting_everything() {
        assert_eq!(
            diff(&[1, 2], &[]).into_edits(),
            vec![Edit::Delete(0), Edit::Delete(1)]
        );
    }

    #[test]
    fn delete_and_insert_indices_use_their_own_space() {
        assert_eq!(
            diff(&["a", "b", "c"], &["a", "c", "d"]).into_edits(),
            vec![Edit::Delete(1), Edit::Insert(2)]
        );
    }

    #[test]
    fn replacement_prefers_insert_first_in_backtrack() {
        // Backtracking visits the insert before the delete; reversed, the
        // delete comes first.
        assert_eq!(
            diff(&[1], &[2]).into_edits(),
            vec![Edit::Delete(0), Edit::Insert(0)]
        );
    }

    #[test]
    fn swapped_pair_keeps_one_element() {
        assert_eq!(
            diff(&[1, 2], &[2, 1]).into_edits(),
            vec![Edit::Delete(0), Edit::Insert(1)]
        );
    }

    #[test]
    fn custom_equality() {
        let source = ["Apple", "banana"];
        let destination = ["apple", "BANANA", "cherry"];
        let diff = diff_by(&source, &destination, |a, b| a.eq_ignore_ascii_case(b));
        assert_eq!(diff.into_edits(), vec![Edit::Insert(2)]);
    }

    #[test]
    fn traces_cover_both_sequences() {
        let traces = traces_by(&[1, 2, 3], &[1, 3, 4], |a, b| a == b);
        assert_eq!(
            traces,
            vec![
                Trace::Match { source: 0, destination: 0 },
                Trace::Delete { source: 1 },
                Trace::Match { source: 2, destination: 1 },
                Trace::Insert { destination: 2 },
            ]
        );
    }
}
