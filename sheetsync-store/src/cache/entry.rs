//! Versioned, timestamped cache entries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with the time it was stored and the version it was stored under.
///
/// Persisted as `{"data": .., "timestamp": <epoch ms>, "version": ".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload.
    pub data: T,
    /// When the entry was written.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Version the entry was written under. Missing versions never match.
    #[serde(default)]
    pub version: String,
}

impl<T> CacheEntry<T> {
    /// Creates an entry stamped with the current time.
    pub fn new(data: T, version: impl Into<String>) -> Self {
        Self::at(data, version, Utc::now())
    }

    /// Creates an entry stamped with the given time.
    pub fn at(data: T, version: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            data,
            timestamp,
            version: version.into(),
        }
    }

    /// Returns true if both entries come from the same write.
    ///
    /// Timestamps are compared at the millisecond precision they persist with.
    pub fn same_write<U>(&self, other: &CacheEntry<U>) -> bool {
        self.version == other.version
            && self.timestamp.timestamp_millis() == other.timestamp.timestamp_millis()
    }

    /// Returns true if the entry matches `expected_version` and is younger than `ttl` at `now`.
    pub fn is_usable(&self, expected_version: &str, ttl: Duration, now: DateTime<Utc>) -> bool {
        if self.version != expected_version {
            return false;
        }

        // A timestamp ahead of `now` (clock skew) counts as fresh.
        match now.signed_duration_since(self.timestamp).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_fresh_entry_is_usable() {
        let now = Utc::now();
        let entry = CacheEntry::at(1, "v1", now - TimeDelta::seconds(299));
        assert!(entry.is_usable("v1", TTL, now));
    }

    #[test]
    fn test_expired_entry_is_not_usable() {
        let now = Utc::now();
        let entry = CacheEntry::at(1, "v1", now - TimeDelta::seconds(300));
        assert!(!entry.is_usable("v1", TTL, now));
    }

    #[test]
    fn test_version_mismatch_is_not_usable() {
        let now = Utc::now();
        let entry = CacheEntry::at(1, "v1", now);
        assert!(!entry.is_usable("v2", TTL, now));
    }

    #[test]
    fn test_same_write_survives_persistence() {
        let entry = CacheEntry::new(serde_json::json!([1]), "v1");
        let reloaded: CacheEntry<serde_json::Value> =
            serde_json::from_str(&serde_json::to_string(&entry).unwrap()).unwrap();
        assert!(entry.same_write(&reloaded));

        let later = CacheEntry::at(1, "v1", entry.timestamp + TimeDelta::milliseconds(5));
        assert!(!entry.same_write(&later));
        assert!(!entry.same_write(&CacheEntry::at(1, "v2", entry.timestamp)));
    }

    #[test]
    fn test_persisted_shape() {
        let entry = CacheEntry::at(vec!["a"], "v1", DateTime::from_timestamp_millis(1_700_000_000_000).unwrap());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["version"], "v1");

        let legacy: CacheEntry<Vec<String>> =
            serde_json::from_str(r#"{"data":["a"],"timestamp":1700000000000}"#).unwrap();
        assert_eq!(legacy.version, "");
    }
}
