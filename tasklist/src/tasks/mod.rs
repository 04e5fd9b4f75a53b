//! Task collection management for `Tasklist`.
//!
//! [`TaskStore`] is the single owner of the task collection and the active
//! filter. Every successful mutation is written through to local storage via
//! [`TaskPersistence`] before the call returns, so a later reader of the same
//! storage always sees the latest state.

pub mod persistence;
pub mod store;

pub use persistence::{PersistenceError, STORAGE_KEY, TaskPersistence};
pub use store::{Outcome, StoreWarning, TaskStore};

use thiserror::Error;

/// Reasons a mutation request is rejected before touching the collection.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task text is empty or whitespace only.
    #[error("task text cannot be empty")]
    TextEmpty,
}
