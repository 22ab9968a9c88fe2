//! Durable key-value storage for session state.
//!
//! [`KeyValueStore`] is the backend seam (in-memory, JSON file). Backends
//! report failures; [`SessionStore`] is the boundary that swallows them so
//! callers only ever see "no session".

pub mod file;
pub mod memory;
pub mod session;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::SessionStore;

use thiserror::Error;

/// Storage backend errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key-value store with synchronous access.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
