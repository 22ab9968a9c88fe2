//! In-process key-value store with an optional byte quota.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStore, StorageError};

/// In-memory store. Cloning is not supported; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    /// Maximum total size of keys plus values, in bytes.
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.lock()?;
        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
