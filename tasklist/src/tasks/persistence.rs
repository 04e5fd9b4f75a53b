//! Reading and writing the task collection under one storage key.

use tasklist_proto::Task;
use tasklist_proto::codec::{self, CodecError};

use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the serialized task collection.
pub const STORAGE_KEY: &str = "tasks";

/// Suffix of the key a corrupt collection is copied to before being replaced.
const QUARANTINE_SUFFIX: &str = ".corrupted";

/// Errors that can occur while loading or saving the task collection.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The stored text is not a valid task collection.
    #[error("stored tasks could not be decoded: {0}")]
    Deserialization(#[source] CodecError),

    /// The collection could not be encoded.
    #[error("tasks could not be encoded: {0}")]
    Serialization(#[source] CodecError),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Persists the whole task collection under a single key.
///
/// Every save replaces the previous value; there are no partial updates.
#[derive(Debug)]
pub struct TaskPersistence<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> TaskPersistence<S> {
    /// Creates an adapter bound to [`STORAGE_KEY`].
    #[must_use]
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, STORAGE_KEY)
    }

    /// Creates an adapter bound to a custom key.
    #[must_use]
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Returns the storage key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the storage backend.
    #[must_use]
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Serializes `tasks` and overwrites the stored collection.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] if encoding fails, or
    /// [`PersistenceError::Storage`] if the write fails (for example when
    /// the quota is exceeded). The stored value is unchanged on error.
    pub fn save(&mut self, tasks: &[Task]) -> Result<(), PersistenceError> {
        let text = codec::encode(tasks).map_err(PersistenceError::Serialization)?;
        self.backend.set(&self.key, &text)?;
        tracing::debug!(key = %self.key, tasks = tasks.len(), "saved task collection");
        Ok(())
    }

    /// Reads the stored collection.
    ///
    /// Returns `Ok(None)` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Deserialization`] if the stored value is
    /// not text or not a valid collection, or [`PersistenceError::Storage`]
    /// if the read fails.
    pub fn load(&self) -> Result<Option<Vec<Task>>, PersistenceError> {
        let text = match self.backend.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(None),
            Err(e @ StorageError::NotText { .. }) => {
                return Err(PersistenceError::Deserialization(
                    CodecError::Serialization(e.to_string()),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let tasks = codec::decode(&text).map_err(PersistenceError::Deserialization)?;
        tracing::debug!(key = %self.key, tasks = tasks.len(), "loaded task collection");
        Ok(Some(tasks))
    }

    /// Key an unreadable collection is copied to, `<key>.corrupted`.
    #[must_use]
    pub fn backup_key(&self) -> String {
        format!("{}{QUARANTINE_SUFFIX}", self.key)
    }

    /// Copies the stored value to [`backup_key`](Self::backup_key) so that
    /// it survives the next save. The copy is byte for byte where the
    /// backend supports it.
    ///
    /// Returns `Ok(false)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Storage`] if the value cannot be read or
    /// the copy cannot be written.
    pub fn quarantine(&mut self) -> Result<bool, PersistenceError> {
        let backup_key = self.backup_key();
        let copied = self.backend.copy(&self.key, &backup_key)?;
        if copied {
            tracing::warn!(key = %backup_key, "kept a copy of unreadable tasks");
        }
        Ok(copied)
    }
}
