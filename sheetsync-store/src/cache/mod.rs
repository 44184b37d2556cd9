//! Two-tier versioned response cache.
//!
//! Entries live in an in-process map and in a persistent [`CacheStorage`]
//! backend. A read checks memory first, then storage. An entry whose
//! version differs from the caller's expected version, or whose age has
//! reached the caller's TTL, is treated as absent and removed from both tiers,
//! unless a concurrent write has replaced it in the meantime.
//!
//! Writes and removals hold the memory lock across the storage call, so a
//! removal never interleaves with a write of the same key.
//!
//! When the backend rejects a write for lack of space, every other entry is
//! evicted from storage and the write is retried once.

mod entry;
mod storage;

pub use entry::CacheEntry;
pub use storage::{CacheStorage, FileStorage, MemoryStorage};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::error::StoreError;

/// Builds a storage-safe cache key, replacing every non-alphanumeric
/// character of each part with `_` and joining parts with `_`.
pub fn cache_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| {
            part.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// Response Cache
// ============================================================================

/// Versioned, TTL-checked key/value cache over memory and a persistent backend.
pub struct ResponseCache {
    memory: RwLock<HashMap<String, CacheEntry<Value>>>,
    storage: Arc<dyn CacheStorage>,
}

impl ResponseCache {
    /// Creates a cache persisting to the given backend.
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            storage,
        }
    }

    /// Creates a cache backed only by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Looks up `key`, returning its data when the entry is usable now.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        expected_version: &str,
        ttl: Duration,
    ) -> Option<T> {
        self.get_at(key, expected_version, ttl, Utc::now()).await
    }

    /// Looks up `key` as of `now`.
    ///
    /// Unusable or undecodable entries are removed from both tiers.
    pub async fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        expected_version: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let cached = self.memory.read().await.get(key).cloned();
        let entry = match cached {
            Some(entry) => entry,
            None => self.load_persisted(key).await?,
        };

        if !entry.is_usable(expected_version, ttl, now) {
            debug!(key = %key, version = %entry.version, "Cache entry stale, removing");
            self.discard(key, &entry).await;
            return None;
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(data) => {
                trace!(key = %key, "Cache hit");
                self.memory.write().await.insert(key.to_string(), entry);
                Some(data)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached data has unexpected shape, removing");
                self.discard(key, &entry).await;
                None
            }
        }
    }

    async fn load_persisted(&self, key: &str) -> Option<CacheEntry<Value>> {
        let raw = match self.storage.read(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache storage read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cache entry, removing");
                self.discard_raw(key, &raw).await;
                None
            }
        }
    }

    /// Removes `stale` from each tier that still holds it.
    ///
    /// A tier whose entry was replaced after `stale` was read keeps the newer one.
    async fn discard(&self, key: &str, stale: &CacheEntry<Value>) {
        let mut memory = self.memory.write().await;
        if memory.get(key).is_some_and(|current| current.same_write(stale)) {
            memory.remove(key);
        }

        let persisted_is_stale = match self.storage.read(key).await {
            Ok(Some(raw)) => serde_json::from_str::<CacheEntry<Value>>(&raw)
                .map_or(true, |current| current.same_write(stale)),
            Ok(None) => false,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache storage read failed");
                false
            }
        };
        if !persisted_is_stale {
            trace!(key = %key, "Persisted entry replaced, keeping it");
            return;
        }
        if let Err(e) = self.storage.remove(key).await {
            warn!(key = %key, error = %e, "Cache storage remove failed");
        }
    }

    /// Removes the persisted value of `key` if it is still exactly `corrupt`.
    async fn discard_raw(&self, key: &str, corrupt: &str) {
        let _memory = self.memory.write().await;
        match self.storage.read(key).await {
            Ok(Some(raw)) if raw == corrupt => {
                if let Err(e) = self.storage.remove(key).await {
                    warn!(key = %key, error = %e, "Cache storage remove failed");
                }
            }
            Ok(_) => trace!(key = %key, "Persisted entry replaced, keeping it"),
            Err(e) => warn!(key = %key, error = %e, "Cache storage read failed"),
        }
    }

    /// Stores `data` under `key` with the given version, stamped now.
    ///
    /// The memory tier always receives the entry. An error means the
    /// persistent tier could not store it, even after evicting other entries.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        version: &str,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry::new(serde_json::to_value(data)?, version);
        self.insert(key, entry).await
    }

    /// Stores a prepared entry under `key`.
    pub async fn insert(&self, key: &str, entry: CacheEntry<Value>) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&entry)?;
        let mut memory = self.memory.write().await;
        memory.insert(key.to_string(), entry);

        match self.storage.write(key, &raw).await {
            Err(e) if e.is_quota_exceeded() => {
                warn!(key = %key, error = %e, "Cache storage full, evicting other entries");
                self.evict_all_except(key).await?;
                self.storage.write(key, &raw).await
            }
            result => result,
        }
    }

    async fn evict_all_except(&self, keep: &str) -> Result<(), StoreError> {
        for key in self.storage.keys().await? {
            if key != keep {
                self.storage.remove(&key).await?;
            }
        }
        Ok(())
    }

    /// Removes `key` from both tiers.
    pub async fn remove(&self, key: &str) {
        let mut memory = self.memory.write().await;
        memory.remove(key);
        if let Err(e) = self.storage.remove(key).await {
            warn!(key = %key, error = %e, "Cache storage remove failed");
        }
    }

    /// Removes every entry from both tiers.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut memory = self.memory.write().await;
        memory.clear();
        for key in self.storage.keys().await? {
            self.storage.remove(&key).await?;
        }
        debug!("Cache cleared");
        Ok(())
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const TTL: Duration = Duration::from_secs(300);

    fn stale_entry(version: &str, age_secs: i64) -> String {
        let entry = CacheEntry::at(
            serde_json::json!(["row"]),
            version,
            Utc::now() - TimeDelta::seconds(age_secs),
        );
        serde_json::to_string(&entry).unwrap()
    }

    #[test]
    fn test_cache_key_sanitizes() {
        assert_eq!(cache_key(&["sheet", "1AbC-x", "Tools!A:F"]), "sheet_1AbC_x_Tools_A_F");
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = ResponseCache::in_memory();
        cache.set("tools", &vec!["a", "b"], "v1").await.unwrap();

        let hit: Option<Vec<String>> = cache.get("tools", "v1", TTL).await;
        assert_eq!(hit, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test]
    async fn test_expired_persisted_entry_is_removed() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write("tools", &stale_entry("v1", 301)).await.unwrap();
        let cache = ResponseCache::new(storage.clone());

        let hit: Option<Vec<String>> = cache.get("tools", "v1", TTL).await;
        assert!(hit.is_none());
        assert_eq!(storage.read("tools").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_version_mismatch_is_removed() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write("tools", &stale_entry("v0", 1)).await.unwrap();
        let cache = ResponseCache::new(storage.clone());

        let hit: Option<Vec<String>> = cache.get("tools", "v1", TTL).await;
        assert!(hit.is_none());
        assert_eq!(storage.read("tools").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_tier_expires_too() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = ResponseCache::new(storage.clone());
        cache.set("token", "abc", "v1").await.unwrap();

        let later = Utc::now() + TimeDelta::seconds(301);
        let hit: Option<String> = cache.get_at("token", "v1", TTL, later).await;
        assert!(hit.is_none());
        assert_eq!(storage.read("token").await.unwrap(), None);

        let again: Option<String> = cache.get("token", "v1", TTL).await;
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_discard_keeps_replacement() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = ResponseCache::new(storage.clone());
        let old = CacheEntry::at(serde_json::json!("old"), "v1", Utc::now() - TimeDelta::seconds(400));
        cache.insert("tools", old.clone()).await.unwrap();
        cache.set("tools", "new", "v1").await.unwrap();

        cache.discard("tools", &old).await;

        let hit: Option<String> = cache.get("tools", "v1", TTL).await;
        assert_eq!(hit.as_deref(), Some("new"));
        assert!(storage.read("tools").await.unwrap().is_some());
    }

    /// Storage whose reads yield once, letting other tasks run mid-lookup.
    struct YieldingStorage(MemoryStorage);

    #[async_trait::async_trait]
    impl CacheStorage for YieldingStorage {
        async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            let value = self.0.read(key).await;
            tokio::task::yield_now().await;
            value
        }

        async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.write(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key).await
        }

        async fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.0.keys().await
        }
    }

    #[tokio::test]
    async fn test_stale_lookup_does_not_drop_concurrent_write() {
        let storage = Arc::new(YieldingStorage(MemoryStorage::new()));
        storage.write("tools", &stale_entry("v1", 301)).await.unwrap();
        let cache = ResponseCache::new(storage.clone());

        let (stale, ()) = tokio::join!(
            cache.get::<Vec<String>>("tools", "v1", TTL),
            async { cache.set("tools", &vec!["fresh"], "v1").await.unwrap() },
        );
        assert!(stale.is_none());

        let hit: Option<Vec<String>> = cache.get("tools", "v1", TTL).await;
        assert_eq!(hit, Some(vec!["fresh".to_string()]));
        assert!(storage.read("tools").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_persisted_entry_survives_new_cache() {
        let storage = Arc::new(MemoryStorage::new());
        ResponseCache::new(storage.clone())
            .set("patterns", &vec![1, 2, 3], "v1")
            .await
            .unwrap();

        let fresh = ResponseCache::new(storage);
        let hit: Option<Vec<u32>> = fresh.get("patterns", "v1", TTL).await;
        assert_eq!(hit, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_removed() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write("tools", "{not json").await.unwrap();
        let cache = ResponseCache::new(storage.clone());

        let hit: Option<Vec<String>> = cache.get("tools", "v1", TTL).await;
        assert!(hit.is_none());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quota_pressure_evicts_others_and_retries() {
        let storage = Arc::new(MemoryStorage::with_quota(200));
        let cache = ResponseCache::new(storage.clone());

        cache.set("a", &"x".repeat(60), "v1").await.unwrap();
        cache.set("b", &"y".repeat(60), "v1").await.unwrap();
        cache.set("c", &"z".repeat(60), "v1").await.unwrap();

        let keys = storage.keys().await.unwrap();
        assert_eq!(keys, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_oversized_write_still_cached_in_memory() {
        let storage = Arc::new(MemoryStorage::with_quota(10));
        let cache = ResponseCache::new(storage.clone());

        let result = cache.set("big", &"x".repeat(100), "v1").await;
        assert!(result.unwrap_err().is_quota_exceeded());

        let hit: Option<String> = cache.get("big", "v1", TTL).await;
        assert_eq!(hit.map(|s| s.len()), Some(100));
    }

    #[tokio::test]
    async fn test_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = ResponseCache::new(storage.clone());
        cache.set("a", &1, "v1").await.unwrap();
        cache.clear().await.unwrap();

        assert!(cache.get::<u32>("a", "v1", TTL).await.is_none());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
