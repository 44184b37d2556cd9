//! Persistent storage backends for the response cache.
//!
//! A backend is a flat string key/value store. Backends may enforce a byte
//! quota, in which case writes that do not fit fail with
//! [`StoreError::QuotaExceeded`] and the cache decides how to make room.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::persistence::write_atomic;

/// File extension used by [`FileStorage`] entries.
const ENTRY_EXTENSION: &str = "json";

// ============================================================================
// Storage Trait
// ============================================================================

/// A string key/value backend for persisted cache entries.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Reads the value stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Lists all stored keys.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Checks that replacing `replaced` bytes with `needed` bytes fits in `quota`.
fn check_quota(quota: Option<u64>, used: u64, replaced: u64, needed: u64) -> Result<(), StoreError> {
    let Some(quota) = quota else {
        return Ok(());
    };

    let available = quota.saturating_sub(used.saturating_sub(replaced));
    if needed > available {
        return Err(StoreError::QuotaExceeded { needed, available });
    }
    Ok(())
}

// ============================================================================
// Memory Storage
// ============================================================================

/// In-memory backend, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStorage {
    /// Creates an unbounded memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a memory backend that holds at most `quota_bytes` of values.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Returns the number of bytes currently stored.
    pub async fn used_bytes(&self) -> u64 {
        self.entries
            .read()
            .await
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let used = entries.values().map(|v| v.len() as u64).sum();
        let replaced = entries.get(key).map_or(0, |v| v.len() as u64);
        check_quota(self.quota_bytes, used, replaced, value.len() as u64)?;

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

// ============================================================================
// File Storage
// ============================================================================

/// On-disk backend storing one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    /// Creates a file backend rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    /// Limits the total size of stored entries.
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.{ENTRY_EXTENSION}"))
    }

    async fn file_len(path: &Path) -> u64 {
        tokio::fs::metadata(path).await.map_or(0, |m| m.len())
    }

    async fn used_bytes(&self) -> Result<u64, StoreError> {
        let mut total = 0;
        for key in self.keys().await? {
            total += Self::file_len(&self.path_for(&key)).await;
        }
        Ok(total)
    }
}

#[async_trait]
impl CacheStorage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if self.quota_bytes.is_some() {
            let used = self.used_bytes().await?;
            let replaced = Self::file_len(&path).await;
            check_quota(self.quota_bytes, used, replaced, value.len() as u64)?;
        }

        debug!(path = %path.display(), "Writing cache file");
        write_atomic(&path, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        Ok(keys)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_quota() {
        let storage = MemoryStorage::with_quota(10);
        storage.write("a", "12345").await.unwrap();
        storage.write("a", "1234567890").await.unwrap();

        let err = storage.write("b", "1").await.unwrap_err();
        assert!(err.is_quota_exceeded());

        storage.remove("a").await.unwrap();
        storage.write("b", "1").await.unwrap();
        assert_eq!(storage.used_bytes().await, 1);
    }

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("cache"));

        assert_eq!(storage.read("missing").await.unwrap(), None);
        assert!(storage.keys().await.unwrap().is_empty());

        storage.write("sheet_abc_Tools_A_F", "{\"x\":1}").await.unwrap();
        assert_eq!(
            storage.read("sheet_abc_Tools_A_F").await.unwrap().as_deref(),
            Some("{\"x\":1}")
        );
        assert_eq!(storage.keys().await.unwrap(), vec!["sheet_abc_Tools_A_F"]);

        storage.remove("sheet_abc_Tools_A_F").await.unwrap();
        storage.remove("sheet_abc_Tools_A_F").await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_storage_quota() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).with_quota(8);

        storage.write("a", "1234").await.unwrap();
        storage.write("b", "1234").await.unwrap();
        assert!(storage.write("c", "1").await.unwrap_err().is_quota_exceeded());
    }
}
