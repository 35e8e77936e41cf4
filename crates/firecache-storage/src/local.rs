use crate::record;
use crate::traits::{CacheStore, StorageError, StorageResult, WriteOutcome};
use async_trait::async_trait;
use firecache_core::constants::CACHE_FILE_EXTENSION;
use firecache_core::{CacheEntry, CanonicalPath};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Local filesystem cache store
///
/// The directory tree under `base_path` mirrors the canonical paths: object
/// `a/b.png` lives in `<base_path>/a/b.png.cache`.
#[derive(Clone, Debug)]
pub struct LocalCacheStore {
    base_path: PathBuf,
    canonical_base: PathBuf,
}

/// Temp file that is removed when dropped, whether or not it was published.
struct TempRecord {
    path: PathBuf,
}

impl Drop for TempRecord {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove temp cache record");
            }
        }
    }
}

impl LocalCacheStore {
    /// Create a new LocalCacheStore, creating the cache root if it is missing
    ///
    /// # Arguments
    /// * `base_path` - Root directory of the cache (e.g., "./cache")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create cache directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let canonical_base = fs::canonicalize(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize cache directory: {}", e))
        })?;

        tracing::info!(cache_root = %canonical_base.display(), "Cache directory ready");

        Ok(LocalCacheStore {
            base_path,
            canonical_base,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a canonical path to its record file with security validation
    ///
    /// Rejects keys that would escape the cache root, either lexically or
    /// through a symlinked directory inside it.
    fn key_to_path(&self, path: &CanonicalPath) -> StorageResult<PathBuf> {
        let key = path.as_str();
        if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidKey(
                "Cache key contains invalid segments".to_string(),
            ));
        }

        let file = self
            .base_path
            .join(format!("{}.{}", key, CACHE_FILE_EXTENSION));
        if !file.starts_with(&self.base_path) {
            return Err(StorageError::InvalidKey(
                "Cache key resolves outside cache directory".to_string(),
            ));
        }

        if let Some(parent) = file.parent() {
            if let Ok(canonical_parent) = parent.canonicalize() {
                if canonical_parent.strip_prefix(&self.canonical_base).is_err() {
                    return Err(StorageError::InvalidKey(
                        "Cache key resolves outside cache directory".to_string(),
                    ));
                }
            }
        }

        Ok(file)
    }

    /// Sibling temp path; never ends in the record extension.
    fn temp_path_for(file: &Path) -> PathBuf {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write `data` to a sibling temp file, sync it and publish it at `file`.
    ///
    /// Blocking. The temp file is gone when this returns, on every path.
    fn persist(file: &Path, data: &[u8]) -> StorageResult<WriteOutcome> {
        let tmp = TempRecord {
            path: Self::temp_path_for(file),
        };

        let mut handle = std::fs::File::create(&tmp.path).map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create temp file {}: {}",
                tmp.path.display(),
                e
            ))
        })?;

        handle.write_all(data).map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write temp file {}: {}",
                tmp.path.display(),
                e
            ))
        })?;

        handle.sync_all().map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync temp file {}: {}",
                tmp.path.display(),
                e
            ))
        })?;
        drop(handle);

        Self::publish(&tmp.path, file)
    }

    /// Publish `tmp` at `file` unless a record already exists there.
    fn publish(tmp: &Path, file: &Path) -> StorageResult<WriteOutcome> {
        let occupied = |file: &Path| {
            StorageError::WriteFailed(format!(
                "Cache record path {} is occupied by a non-file",
                file.display()
            ))
        };

        match std::fs::hard_link(tmp, file) {
            Ok(()) => Ok(WriteOutcome::Written),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if file.is_file() {
                    Ok(WriteOutcome::AlreadyPresent)
                } else {
                    Err(occupied(file))
                }
            }
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                // No hard links on this filesystem.
                if file.is_file() {
                    return Ok(WriteOutcome::AlreadyPresent);
                }
                if file.exists() {
                    return Err(occupied(file));
                }
                std::fs::rename(tmp, file).map_err(|e| {
                    StorageError::WriteFailed(format!(
                        "Failed to publish cache record {}: {}",
                        file.display(),
                        e
                    ))
                })?;
                Ok(WriteOutcome::Written)
            }
            Err(e) => Err(StorageError::WriteFailed(format!(
                "Failed to publish cache record {}: {}",
                file.display(),
                e
            ))),
        }
    }
}

async fn is_record(file: &Path) -> bool {
    fs::metadata(file)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn exists(&self, path: &CanonicalPath) -> StorageResult<bool> {
        let file = self.key_to_path(path)?;
        match fs::metadata(&file).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn read(&self, path: &CanonicalPath) -> StorageResult<CacheEntry> {
        let file = self.key_to_path(path)?;
        let start = std::time::Instant::now();

        let data = match fs::read(&file).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to read cache record {}: {}",
                    file.display(),
                    e
                )));
            }
        };

        let entry = record::decode(&data).map_err(|e| {
            tracing::error!(path = %file.display(), key = %path, error = %e, "Unreadable cache record");
            e
        })?;

        tracing::debug!(
            path = %file.display(),
            key = %path,
            size_bytes = entry.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cache read successful"
        );

        Ok(entry)
    }

    async fn write(
        &self,
        path: &CanonicalPath,
        entry: &CacheEntry,
    ) -> StorageResult<WriteOutcome> {
        let file = self.key_to_path(path)?;

        if is_record(&file).await {
            tracing::debug!(key = %path, "Cache entry already present, skipping write");
            return Ok(WriteOutcome::AlreadyPresent);
        }

        let data = record::encode(entry)?;
        self.ensure_parent_dir(&file).await?;

        let start = std::time::Instant::now();
        let size_bytes = data.len();
        let target = file.clone();
        // The blocking task runs to completion even if this future is dropped.
        let outcome = tokio::task::spawn_blocking(move || Self::persist(&target, &data))
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Cache write task failed: {}", e)))??;

        tracing::info!(
            path = %file.display(),
            key = %path,
            size_bytes,
            outcome = ?outcome,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cache write finished"
        );

        Ok(outcome)
    }
}
