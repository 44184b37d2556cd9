// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `SheetSync` Fetch
//!
//! Authenticated, quota-aware access to spreadsheet-backed data.
//!
//! ## Authentication
//!
//! - [`credentials::CredentialStore`] - Service-account credentials and their lookup chain
//! - [`jwt::JwtSigner`] - RS256 assertion signing
//! - [`token::TokenProvider`] - Cached OAuth2 access tokens
//!
//! ## Fetching
//!
//! - [`rate_limit::RateLimiter`] - Sliding-window request ceiling with minimum spacing
//! - [`retry::RetryStrategy`] - Backoff policy with longer waits after rate limiting
//! - [`fetcher::SheetFetcher`] - Cached, retried range reads and appends
//! - [`facade::SyncFacade`] - Entity reads and submissions
//!
//! ## Host APIs
//!
//! - [`host::http`] - The transport seam and its reqwest client
//! - `host::scripted` - Scripted transport, behind the `test-util` feature
//!
//! ## Example
//!
//! ```ignore
//! use sheetsync_core::EntityKind;
//! use sheetsync_fetch::SyncFacade;
//! use sheetsync_store::SyncConfig;
//!
//! let facade = SyncFacade::from_config(SyncConfig::load().await?);
//!
//! // Empty on any failure; use `load_entities` to see why.
//! let tools = facade.fetch_entities(EntityKind::Tool).await;
//! ```

pub mod credentials;
pub mod error;
pub mod facade;
pub mod fetcher;
pub mod host;
pub mod jwt;
pub mod rate_limit;
pub mod retry;
pub mod token;

// Errors
pub use error::{FetchError, HttpError, TokenFailureKind};

// Host APIs
pub use host::http::{HttpClient, HttpTransport, TransportResponse};
#[cfg(any(test, feature = "test-util"))]
pub use host::scripted::{Method, RecordedRequest, ScriptedTransport};

// Authentication
pub use credentials::{credential_paths, CredentialStore, Credentials};
pub use jwt::JwtSigner;
pub use token::TokenProvider;

// Fetching
pub use facade::SyncFacade;
pub use fetcher::SheetFetcher;
pub use rate_limit::RateLimiter;
pub use retry::RetryStrategy;
