// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `SheetSync` Store
//!
//! Caching, persistence and configuration for the `SheetSync` client.
//!
//! This crate provides:
//!
//! - **ResponseCache**: versioned, TTL-checked cache over memory and a persistent backend
//! - **CacheStorage**: persistent backends ([`MemoryStorage`], [`FileStorage`])
//! - **SyncConfig**: sheet ids, quotas, retry and cache settings
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sheetsync_store::{FileStorage, ResponseCache};
//!
//! let cache = ResponseCache::new(Arc::new(FileStorage::new("/tmp/sheetsync")));
//! cache.set("tools", &rows, "1").await?;
//!
//! let rows: Option<Vec<Vec<String>>> = cache.get("tools", "1", Duration::from_secs(300)).await;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;

pub use cache::{cache_key, CacheEntry, CacheStorage, FileStorage, MemoryStorage, ResponseCache};
pub use config::{CacheConfig, RateLimitConfig, ResourceConfig, RetryConfig, SyncConfig};
pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_config_path, ensure_dir, load_json, save_json,
    write_atomic,
};
