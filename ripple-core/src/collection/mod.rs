//! Observable Collections
//!
//! Collections that report their mutations as [`Changeset`]s, and operators
//! deriving new sources from them.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use ripple_core::collection::ObservableArray;
//!
//! let items = ObservableArray::new(vec!["a", "b", "c"]);
//!
//! // A view replaying changesets against its own copy.
//! let view = Arc::new(Mutex::new(Vec::new()));
//! let rows = view.clone();
//! let _subscription = items.subscribe(move |changeset| {
//!     changeset.apply_to(&mut rows.lock());
//! });
//!
//! items.replace_with_diff(vec!["a", "c", "d"], |a, b| a == b);
//! assert_eq!(*view.lock(), vec!["a", "c", "d"]);
//! ```

mod changeset;
mod observable;
mod operators;

pub use changeset::{Change, Changeset};
pub use observable::{ObservableArray, ObservableCollection, ObservableTree};
pub use operators::ObservableExt;
