//! Ripple Core
//!
//! This crate provides observable collections that report their mutations as
//! minimal, ordered edit scripts, so a consumer such as a list or tree view
//! can patch its own copy instead of reloading everything.
//!
//! It implements:
//!
//! - An event dispatch core (dispatchers, replaying sources, self-retaining
//!   managed sources)
//! - An LCS sequence diff and its recursive generalization to trees
//! - A patch protocol that orders edits so indices stay valid while applied
//! - Observable flat and tree collections emitting changesets
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Dispatch, replay and lifecycle of event sources
//! - `diff`: Index paths, edit scripts, diff engines and patch application
//! - `collection`: Changesets, observable collections and derived sources
//! - `config`: Options shared by all sources
//! - `error`: Patch errors
//!
//! # Example
//!
//! ```rust
//! use ripple_core::collection::ObservableArray;
//!
//! let items = ObservableArray::new(vec![1, 2, 3]);
//!
//! let _subscription = items.subscribe(|changeset| {
//!     if changeset.is_reset() {
//!         println!("reload {:?}", changeset.collection());
//!     } else {
//!         println!("apply {:?}", changeset.operations());
//!     }
//! });
//!
//! // Emits a single delete and a single insert.
//! items.replace_with_diff(vec![1, 3, 4], |a, b| a == b);
//! ```

pub mod collection;
pub mod config;
pub mod diff;
pub mod error;
pub mod reactive;

pub use collection::{Changeset, ObservableArray, ObservableExt, ObservableTree};
pub use config::SourceOptions;
pub use diff::{Diff, Edit, IndexPath, Operation};
pub use error::PatchError;
pub use reactive::{Observable, Subscription};
