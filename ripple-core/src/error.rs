//! Error types for patch application.
//!
//! Applying an operation at an index that does not exist is a programming
//! error. The panicking entry points (`apply`, `remove`, `pop`, ...) turn these
//! errors into panics; the `try_*` variants hand them back to the caller.

use thiserror::Error;

use crate::diff::IndexPath;

/// An operation addressed an index or path the collection does not have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("index path {path} does not address a node")]
    PathOutOfRange { path: IndexPath },

    #[error("operation requires a non-empty index path")]
    EmptyPath,

    #[error("cannot remove an element from an empty collection")]
    EmptyCollection,
}

/// Unwrap the result of a fallible patch step, treating an error as a fatal
/// invariant violation.
#[track_caller]
pub(crate) fn fatal<T>(result: Result<T, PatchError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
