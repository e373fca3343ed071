//! Client-scoped key-value persistence.
//!
//! The analytics core never assumes a storage technology; it talks to a
//! [`KvStore`] and degrades gracefully when that store misbehaves. Reads
//! from an unavailable store produce empty defaults, writes become no-ops
//! with a diagnostic, and records that fail to decode are discarded and
//! reinitialized. None of this is ever fatal to the caller.

pub mod file;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal read/write/delete contract every backing store satisfies.
///
/// Per-key serialization is the store's responsibility: concurrent writes
/// to the same key must be atomic at the value level, which every
/// reasonable backend (embedded db, file rename, remote kv) provides.
pub trait KvStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and decodes a JSON record, degrading to `None` on every failure
/// mode: a missing key, an unavailable store, or a corrupted record.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(error = %err, key, "storage read failed, treating as empty");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, key, "discarding corrupted record");
            if let Err(err) = store.delete(key) {
                tracing::warn!(error = %err, key, "failed to remove corrupted record");
            }
            None
        }
    }
}

/// Serializes and writes a JSON record. Write failures are logged and
/// swallowed; the in-memory result the caller already holds stays valid.
pub fn store_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, key, "failed to serialize record, skipping write");
            return;
        }
    };
    if let Err(err) = store.write(key, &raw) {
        tracing::warn!(error = %err, key, "storage write failed, record not persisted");
    }
}
