//! Diff and Patch Engine
//!
//! Computes minimal edit scripts between two states of a collection and
//! turns them into mutations that can be replayed against a live copy.
//!
//! # Pieces
//!
//! - [`sequence`]: LCS diff of two slices, producing a [`Diff<usize>`].
//! - [`tree`]: the same, level by level over nested children, producing a
//!   [`Diff<IndexPath>`].
//! - [`patch`]: orders a diff into [`Operation`]s (deletes descending,
//!   inserts ascending, updates, moves) and applies them to anything
//!   [`Patchable`].
//! - [`squash`]: the way back, condensing an applied patch into a [`Diff`].
//!
//! # Example
//!
//! ```rust
//! use ripple_core::diff::{self, apply_diff};
//!
//! let source = vec!["a", "b", "c"];
//! let destination = vec!["a", "c", "d"];
//!
//! let edits = diff::diff(&source, &destination);
//! assert_eq!(edits.to_string(), "[D(1), I(2)]");
//!
//! let mut view = source.clone();
//! apply_diff(&edits, &mut view, &destination);
//! assert_eq!(view, destination);
//! ```

mod edit;
mod index_path;
pub mod patch;
pub mod sequence;
pub mod squash;
pub mod tree;

pub use edit::{Diff, Edit};
pub use index_path::IndexPath;
pub use patch::{apply_diff, try_apply_diff, Diffable, Operation, Patchable};
pub use sequence::{diff, diff_by};
pub use squash::Squash;
pub use tree::{diff_tree, diff_tree_by, Tree, TreeArray, TreeNode};
