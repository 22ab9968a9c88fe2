//! JSON-file key-value store.
//!
//! The whole store is one JSON object. Writes go to a sibling temp file that
//! is renamed over the original so a crash never leaves a half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// File-backed store rooted at a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at the platform data directory: `<data_dir>/tcw/session.json`.
    pub fn default_location() -> Self {
        Self::new(default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), entries = entries.len(), "session file written");
        Ok(())
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file store lock poisoned".into()))?;
        let (mut entries, corrupt) = match self.read_all() {
            Err(StorageError::Corrupt(e)) => {
                warn!(path = %self.path.display(), error = %e, "session file corrupt, starting over");
                (BTreeMap::new(), true)
            }
            other => (other?, false),
        };
        if f(&mut entries) || corrupt {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file store lock poisoned".into()))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|entries| entries.remove(key).is_some())
    }
}

/// Path to the default session file.
fn default_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tcw")
        .join("session.json")
}
