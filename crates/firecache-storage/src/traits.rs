//! Cache store abstraction trait

use async_trait::async_trait;
use firecache_core::{AppError, CacheEntry, CanonicalPath};
use thiserror::Error;

/// Cache store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Cache entry corrupt: {0}")]
    Corrupt(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for cache store operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupt(msg) => AppError::CacheCorrupt(msg),
            StorageError::InvalidKey(msg) => AppError::MalformedUrl(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// What a [`CacheStore::write`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// This call created the entry.
    Written,
    /// An entry already existed and was left untouched.
    AlreadyPresent,
}

/// Persistent map from canonical storage path to cache entry.
///
/// Entries are write-once: the first successful write for a path wins and
/// later writes are discarded without error. Readers never observe a
/// partially written entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Check if an entry exists for `path`
    async fn exists(&self, path: &CanonicalPath) -> StorageResult<bool>;

    /// Read the entry for `path`
    ///
    /// Fails with [`StorageError::NotFound`] when absent and
    /// [`StorageError::Corrupt`] when the stored record cannot be decoded.
    async fn read(&self, path: &CanonicalPath) -> StorageResult<CacheEntry>;

    /// Store `entry` under `path` unless an entry is already present
    async fn write(&self, path: &CanonicalPath, entry: &CacheEntry)
        -> StorageResult<WriteOutcome>;
}
