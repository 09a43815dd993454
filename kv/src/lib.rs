//! Key-value object store interface and implementations.
//!
//! Keys name objects the way a bucket does (`"alice.wav"`, `"alice.json"`),
//! values are opaque bytes. Three backends share the same semantics:
//!
//! - [`MemoryStore`]: a `HashMap`, for tests and ephemeral servers
//! - [`FsStore`]: one file per key inside a directory
//! - [`RedbStore`]: a single redb database file

pub mod fs;
pub mod memory;
pub mod redb;

use std::fmt;
use thiserror::Error;

/// Longest accepted key, in bytes.
pub const MAX_KEY_LEN: usize = 255;

/// Errors that can occur in KV store operations.
#[derive(Error, Debug)]
pub enum KVError {
    #[error("kv: invalid key {0:?}")]
    InvalidKey(String),

    #[error("kv: storage error: {0}")]
    Storage(String),

    #[error("kv: io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for KV operations.
pub type KVResult<T> = Result<T, KVError>;

/// Checks that `key` can name an object in every backend.
///
/// Keys must be non-empty, at most [`MAX_KEY_LEN`] bytes, must not start
/// with `.` and must not contain `/`, `\` or NUL.
pub fn validate_key(key: &str) -> KVResult<()> {
    let bad = key.is_empty()
        || key.len() > MAX_KEY_LEN
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(KVError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Key-value store trait.
///
/// Implementations are shared across threads behind an `Arc`.
pub trait KVStore: Send + Sync {
    /// Get a value by key. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one.
    fn put(&self, key: &str, value: &[u8]) -> KVResult<()>;

    /// Delete a key. Returns whether it existed.
    fn delete(&self, key: &str) -> KVResult<bool>;

    /// All keys, sorted.
    fn keys(&self) -> KVResult<Vec<String>>;

    /// Store several values. Backends with transactions apply them atomically.
    fn batch_put(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// Keys ending in `suffix`, sorted.
    fn list_suffix(&self, suffix: &str) -> KVResult<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.ends_with(suffix))
            .collect())
    }

    /// Whether `key` is present.
    fn contains(&self, key: &str) -> KVResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl fmt::Debug for dyn KVStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVStore {{ ... }}")
    }
}

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use redb::RedbStore;
