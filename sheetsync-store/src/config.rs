//! Configuration management.
//!
//! The configuration names the sheets backing each entity kind, where the
//! service-account credentials live, and the quota, retry and cache
//! parameters. Every field has a default, so a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sheetsync_core::EntityKind;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};

/// Environment variable overriding the tools spreadsheet id.
pub const ENV_TOOLS_SHEET_ID: &str = "SHEETSYNC_TOOLS_SHEET_ID";
/// Environment variable overriding the patterns spreadsheet id.
pub const ENV_PATTERNS_SHEET_ID: &str = "SHEETSYNC_PATTERNS_SHEET_ID";
/// Environment variable pointing at the service-account credential file.
pub const ENV_CREDENTIALS: &str = "SHEETSYNC_CREDENTIALS";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the spreadsheet values API.
    pub api_base: String,
    /// OAuth2 token endpoint, also used as the JWT audience.
    pub token_endpoint: String,
    /// OAuth2 scope requested for the access token.
    pub scope: String,
    /// Path to the service-account JSON file.
    pub credentials_path: Option<PathBuf>,
    /// Directory for persisted cache entries. `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,
    /// Version stamped on every cache entry; bump to invalidate old entries.
    pub cache_version: String,
    /// Tools sheet.
    pub tools: ResourceConfig,
    /// Patterns sheet.
    pub patterns: ResourceConfig,
    /// Cache lifetimes.
    pub cache: CacheConfig,
    /// Request quota.
    pub rate_limit: RateLimitConfig,
    /// Retry policy for reads.
    pub retry: RetryConfig,
}

/// A sheet backing one entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Spreadsheet id.
    pub spreadsheet_id: String,
    /// A1 range read for the entity list, header row included.
    pub range: String,
    /// A1 range rows are appended to.
    pub append_range: String,
}

impl ResourceConfig {
    fn new(range: &str) -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: range.to_string(),
            append_range: range.to_string(),
        }
    }

    /// Returns true if a spreadsheet id is set.
    pub fn is_configured(&self) -> bool {
        !self.spreadsheet_id.trim().is_empty()
    }
}

/// Cache lifetimes in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Raw sheet responses.
    pub sheet_ttl_secs: u64,
    /// Transformed entity lists.
    pub entity_ttl_secs: u64,
    /// OAuth access tokens. Kept below the one-hour assertion lifetime.
    pub token_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sheet_ttl_secs: 5 * 60,
            entity_ttl_secs: 5 * 60,
            token_ttl_secs: 50 * 60,
        }
    }
}

impl CacheConfig {
    /// Sheet response TTL.
    pub fn sheet_ttl(&self) -> Duration {
        Duration::from_secs(self.sheet_ttl_secs)
    }

    /// Entity list TTL.
    pub fn entity_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_ttl_secs)
    }

    /// Access token TTL.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Sliding-window request quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed in any trailing 60 seconds.
    pub max_requests_per_minute: usize,
    /// Minimum spacing between consecutive requests.
    pub min_interval_ms: u64,
    /// Extra wait after the oldest request leaves the window.
    pub safety_buffer_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 50,
            min_interval_ms: 1000,
            safety_buffer_ms: 100,
        }
    }
}

/// Retry policy for sheet reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Multiplier raised to the attempt number, in seconds.
    pub multiplier: u64,
    /// Constant added to the backoff after a rate-limit rejection, in seconds.
    pub rate_limit_base_secs: u64,
    /// Upper bound on any single wait, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            multiplier: 2,
            rate_limit_base_secs: 5,
            max_delay_secs: 60,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            scope: "https://www.googleapis.com/auth/spreadsheets".to_string(),
            credentials_path: None,
            cache_dir: None,
            cache_version: "1".to_string(),
            tools: ResourceConfig::new("Tools!A:F"),
            patterns: ResourceConfig::new("Patterns!A:G"),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path, applying environment overrides.
    ///
    /// A missing file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        let mut config = if path.exists() {
            let config: SyncConfig = load_json(path).await?;
            info!(path = %path.display(), "Loaded configuration");
            config
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.fill_ranges();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a specific path with owner-only permissions.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Restores default ranges left empty by a partial resource section.
    fn fill_ranges(&mut self) {
        let defaults = Self::default();
        for (resource, default) in [
            (&mut self.tools, defaults.tools),
            (&mut self.patterns, defaults.patterns),
        ] {
            if resource.range.trim().is_empty() {
                resource.range = default.range;
            }
            if resource.append_range.trim().is_empty() {
                resource.append_range = resource.range.clone();
            }
        }
    }

    /// Applies `SHEETSYNC_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty(ENV_TOOLS_SHEET_ID) {
            self.tools.spreadsheet_id = id;
        }
        if let Some(id) = non_empty(ENV_PATTERNS_SHEET_ID) {
            self.patterns.spreadsheet_id = id;
        }
        if let Some(path) = non_empty(ENV_CREDENTIALS) {
            self.credentials_path = Some(PathBuf::from(path));
        }
    }

    /// Rejects settings the client cannot operate with.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.rate_limit.max_requests_per_minute == 0 {
            return Err(StoreError::Config(
                "rate_limit.max_requests_per_minute must be at least 1".to_string(),
            ));
        }
        if self.cache.token_ttl_secs >= 3600 {
            return Err(StoreError::Config(
                "cache.token_ttl_secs must be shorter than the one-hour token lifetime".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the sheet backing `kind`.
    pub fn resource(&self, kind: EntityKind) -> &ResourceConfig {
        match kind {
            EntityKind::Tool => &self.tools,
            EntityKind::Pattern => &self.patterns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.cache.token_ttl(), Duration::from_secs(3000));
        assert_eq!(config.cache.sheet_ttl(), Duration::from_secs(300));
        assert_eq!(config.retry.max_retries, 2);
        assert!(!config.resource(EntityKind::Tool).is_configured());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"tools": {"spreadsheet_id": "abc"}, "rate_limit": {"min_interval_ms": 250}}"#).unwrap();

        let config = SyncConfig::load_from(&path).await.unwrap();
        assert_eq!(config.tools.spreadsheet_id, "abc");
        assert_eq!(config.tools.range, "Tools!A:F");
        assert_eq!(config.tools.append_range, "Tools!A:F");
        assert_eq!(config.rate_limit.min_interval_ms, 250);
        assert_eq!(config.rate_limit.max_requests_per_minute, 50);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let mut config = SyncConfig::default();
        config.patterns.spreadsheet_id = "xyz".to_string();
        config.save_to(&path).await.unwrap();

        let loaded = SyncConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded.patterns.spreadsheet_id, "xyz");
        assert_eq!(loaded.patterns.range, "Patterns!A:G");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_config_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        SyncConfig::default().save_to(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_TOOLS_SHEET_ID, "tools-id"),
            (ENV_PATTERNS_SHEET_ID, "  "),
            (ENV_CREDENTIALS, "/tmp/sa.json"),
        ]);

        let mut config = SyncConfig::default();
        config.apply_overrides(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.tools.spreadsheet_id, "tools-id");
        assert_eq!(config.patterns.spreadsheet_id, "");
        assert_eq!(config.credentials_path, Some(PathBuf::from("/tmp/sa.json")));
    }

    #[test]
    fn test_validate_rejects_long_token_ttl() {
        let mut config = SyncConfig::default();
        config.cache.token_ttl_secs = 3600;
        assert!(config.validate().is_err());
    }
}
