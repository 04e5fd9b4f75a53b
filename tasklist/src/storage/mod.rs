//! Local key-value storage for persisted application state.
//!
//! Defines the [`KeyValueStore`] trait, a string-keyed, string-valued store
//! with whole-value overwrite semantics, plus two backends:
//! - [`FileStore`]: one file per key inside a data directory
//! - [`MemoryStore`]: in-process map, for tests and throwaway sessions
//!
//! Both backends can enforce a byte quota. A write that would exceed it
//! fails with [`StorageError::QuotaExceeded`] and leaves the previous value
//! in place.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The write would push the store past its byte quota.
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        /// Total bytes the store would hold after the write.
        needed: u64,
        /// Configured quota in bytes.
        quota: u64,
    },

    /// Reading a stored value failed.
    #[error("failed to read {key}: {source}")]
    Read {
        /// Key being read.
        key: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The stored value is not valid UTF-8 text.
    #[error("stored value for {key} is not valid UTF-8 text")]
    NotText {
        /// Key being read.
        key: String,
    },

    /// Writing a value failed.
    #[error("failed to write {key}: {source}")]
    Write {
        /// Key being written.
        key: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The key cannot be used as a storage slot.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The store refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store with overwrite-on-write semantics.
///
/// Implementations include:
/// - [`FileStore`]: durable, directory-backed
/// - [`MemoryStore`]: in-memory, with optional fault injection
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails or exceeds the quota.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the value under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be modified.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Copies the value under `from` to `to`, overwriting `to`.
    ///
    /// Returns `Ok(false)` if `from` holds nothing. Backends that can copy
    /// raw contents should do so, so that values [`get`](Self::get) cannot
    /// decode still survive the copy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if `from` cannot be read or `to` written.
    fn copy(&mut self, from: &str, to: &str) -> Result<bool, StorageError> {
        match self.get(from)? {
            Some(value) => self.set(to, &value).map(|()| true),
            None => Ok(false),
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<bool, StorageError> {
        (**self).copy(from, to)
    }
}

/// Checks that `key` is usable as a storage slot name.
///
/// Keys are non-empty, at most 128 bytes, made of ASCII letters, digits,
/// `-`, `_` and `.`, and do not start with `.`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] otherwise.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Bytes a single entry counts against a quota.
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn entry_size(key: &str, value_len: usize) -> u64 {
    (key.len() + value_len) as u64
}
