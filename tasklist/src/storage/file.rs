//! Directory-backed key-value store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError, entry_size, validate_key};

/// Suffix of the temporary file a write goes through before the rename.
const TMP_SUFFIX: &str = ".tmp";

/// A durable key-value store keeping each key in its own file.
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so a crash mid-write never leaves a half-written value behind.
/// The directory is created on the first write, so opening a store never
/// touches the file system.
///
/// Multiple `FileStore` instances pointing at the same directory are not
/// coordinated; the application opens exactly one per session.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStore {
    /// Creates a store rooted at `dir` with no quota.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    /// Limits the total bytes (keys plus values) the store may hold.
    #[must_use]
    pub const fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Bytes currently held by every key except `skip`.
    fn used_bytes_excluding(&self, skip: &str) -> Result<u64, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StorageError::Read {
                    key: skip.to_string(),
                    source,
                });
            }
        };

        let mut total = 0u64;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name == skip || name.ends_with(TMP_SUFFIX) || validate_key(name).is_err() {
                continue;
            }
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            total += entry_size(name, 0) + len;
        }
        Ok(total)
    }

    /// Raw bytes stored under `key`, or `None` if the file does not exist.
    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(path = ?path, bytes = bytes.len(), "read stored value");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Replaces the file for `key` with `bytes`, enforcing the quota.
    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_excluding(key)? + entry_size(key, bytes.len());
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        let write_err = |source| StorageError::Write {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{key}{TMP_SUFFIX}"));
        fs::write(&tmp_path, bytes).map_err(write_err)?;
        if let Err(source) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(source));
        }

        tracing::debug!(path = ?path, bytes = bytes.len(), "stored value");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let Some(bytes) = self.read_bytes(key)? else {
            return Ok(None);
        };
        String::from_utf8(bytes).map(Some).map_err(|_| StorageError::NotText {
            key: key.to_string(),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.write_bytes(key, value.as_bytes())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Copies the file byte for byte, whether or not it holds valid text.
    fn copy(&mut self, from: &str, to: &str) -> Result<bool, StorageError> {
        validate_key(from)?;
        validate_key(to)?;
        let Some(bytes) = self.read_bytes(from)? else {
            return Ok(false);
        };
        self.write_bytes(to, &bytes)?;
        Ok(true)
    }
}
