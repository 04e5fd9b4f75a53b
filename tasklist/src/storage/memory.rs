//! In-memory key-value store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{KeyValueStore, StorageError, entry_size, validate_key};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    quota_bytes: Option<u64>,
    fail_writes: bool,
    fail_reads: bool,
    writes: usize,
}

/// An in-memory key-value store.
///
/// Clones share the same underlying map, the way every page of a browser
/// origin sees the same local storage. Tests use this to hand one handle to
/// a task store and keep another for inspection or for a second session.
///
/// Not thread-safe; the application is single-threaded.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store limited to `quota_bytes` (keys plus values).
    #[must_use]
    pub fn with_quota(quota_bytes: u64) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().quota_bytes = Some(quota_bytes);
        store
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Makes every subsequent read fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    /// Number of successful writes since creation.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Returns the raw value under `key` without going through the trait.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Seeds `key` with `value`, bypassing quota and fault injection.
    pub fn seed(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        if self.inner.borrow().fail_reads {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        if let Some(quota) = inner.quota_bytes {
            let others: u64 = inner
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| entry_size(k, v.len()))
                .sum();
            let needed = others + entry_size(key, value.len());
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        drop(inner);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        inner.entries.remove(key);
        drop(inner);
        Ok(())
    }
}
