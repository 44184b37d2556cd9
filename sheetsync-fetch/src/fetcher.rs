//! Sheet range fetching with caching, rate limiting and retries.
//!
//! A read is served from the response cache when possible. Otherwise each
//! attempt takes a rate-limiter slot and an access token, then requests the
//! range with formulas preserved. Rate-limit rejections back off longer than
//! other failures. Hyperlink formulas in the result are rewritten to link
//! JSON before the rows are cached.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use sheetsync_core::{normalize_cell, Rows};
use sheetsync_store::{cache_key, ResponseCache, SyncConfig};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{classify_http_error, FetchError, HttpError};
use crate::host::http::{HttpTransport, TransportResponse};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryStrategy;
use crate::token::TokenProvider;

/// Default spreadsheet values API base.
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Default lifetime of cached ranges.
const DEFAULT_SHEET_TTL: Duration = Duration::from_secs(5 * 60);

/// Values API response.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Fetches and appends sheet ranges through the shared token, quota and cache.
pub struct SheetFetcher {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenProvider>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    retry: RetryStrategy,
    api_base: String,
    cache_version: String,
    ttl: Duration,
}

impl SheetFetcher {
    /// Creates a fetcher with default API base, TTL and retry policy.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenProvider>,
        limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            transport,
            tokens,
            limiter,
            cache,
            retry: RetryStrategy::default(),
            api_base: DEFAULT_API_BASE.to_string(),
            cache_version: "1".to_string(),
            ttl: DEFAULT_SHEET_TTL,
        }
    }

    /// Creates a fetcher using the API base, TTL and retry policy from `config`.
    pub fn from_config(
        config: &SyncConfig,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenProvider>,
        limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            retry: RetryStrategy::from(&config.retry),
            api_base: config.api_base.clone(),
            cache_version: config.cache_version.clone(),
            ttl: config.cache.sheet_ttl(),
            ..Self::new(transport, tokens, limiter, cache)
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the cache key of a range.
    pub fn sheet_cache_key(resource_id: &str, range: &str) -> String {
        cache_key(&["sheet", resource_id, range.trim()])
    }

    /// Fetches a range, returning `None` on any failure.
    ///
    /// A successful read of an empty range yields `Some` of an empty list.
    pub async fn fetch(&self, resource_id: &str, range: &str) -> Option<Rows> {
        match self.fetch_rows(resource_id, range).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(resource = %resource_id, range = %range, error = %e, "Sheet fetch failed");
                None
            }
        }
    }

    /// Fetches a range, returning the failure when every attempt fails.
    #[instrument(skip(self))]
    pub async fn fetch_rows(&self, resource_id: &str, range: &str) -> Result<Rows, FetchError> {
        let key = Self::sheet_cache_key(resource_id, range);
        if let Some(rows) = self
            .cache
            .get::<Rows>(&key, &self.cache_version, self.ttl)
            .await
        {
            debug!(key = %key, rows = rows.len(), "Serving range from cache");
            return Ok(rows);
        }

        let mut attempt = 0;
        loop {
            let error = match self.fetch_once(resource_id, range).await {
                Ok(rows) => {
                    if !rows.is_empty() {
                        if let Err(e) = self.cache.set(&key, &rows, &self.cache_version).await {
                            warn!(key = %key, error = %e, "Failed to cache range");
                        }
                    }
                    info!(rows = rows.len(), attempt, "Fetched range");
                    return Ok(rows);
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }
            if attempt >= self.retry.max_retries {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(error),
                });
            }

            let delay = self.retry.delay_for_attempt(attempt, error.is_rate_limited());
            warn!(
                error = %error,
                attempt,
                delay_secs = delay.as_secs(),
                "Range fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_once(&self, resource_id: &str, range: &str) -> Result<Rows, FetchError> {
        self.limiter.acquire().await;
        let token = self.tokens.try_access_token().await?;

        let url = self.values_url(resource_id, range)?;
        let response = self
            .transport
            .get(&url, &token)
            .await
            .map_err(classify_http_error)?;

        self.check_status(&response).await?;

        let values: ValuesResponse = response
            .parse()
            .map_err(|e| FetchError::MalformedData(format!("values response: {e}")))?;

        Ok(values
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    /// Appends rows after the last row of `range`. Not retried.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn append(
        &self,
        resource_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), FetchError> {
        self.limiter.acquire().await;
        let token = self.tokens.try_access_token().await?;

        let url = self.append_url(resource_id, range)?;
        let body = serde_json::json!({ "values": rows });
        let response = self
            .transport
            .post_json(&url, &token, &body)
            .await
            .map_err(classify_http_error)?;

        self.check_status(&response).await?;
        info!("Appended rows");
        Ok(())
    }

    /// Drops the cached copy of a range.
    pub async fn invalidate(&self, resource_id: &str, range: &str) {
        self.cache.remove(&Self::sheet_cache_key(resource_id, range)).await;
    }

    async fn check_status(&self, response: &TransportResponse) -> Result<(), FetchError> {
        if response.is_success() {
            return Ok(());
        }
        if response.is_rate_limited() {
            return Err(FetchError::RateLimited {
                retry_after: response.retry_after,
            });
        }
        if response.status == 401 {
            debug!("Access token rejected, dropping cached token");
            self.tokens.invalidate().await;
        }
        Err(FetchError::Status {
            status: response.status,
            body: response.body_excerpt(),
        })
    }

    fn values_url(&self, resource_id: &str, range: &str) -> Result<String, FetchError> {
        let mut url = self.range_url(resource_id, range.trim())?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMULA")
            .append_pair("majorDimension", "ROWS");
        Ok(url.into())
    }

    fn append_url(&self, resource_id: &str, range: &str) -> Result<String, FetchError> {
        let mut url = self.range_url(resource_id, &format!("{}:append", range.trim()))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url.into())
    }

    fn range_url(&self, resource_id: &str, last_segment: &str) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::Http(HttpError::InvalidUrl(reason));

        let mut url = Url::parse(&self.api_base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("{} cannot be a base", self.api_base)))?
            .pop_if_empty()
            .push(resource_id)
            .push("values")
            .push(last_segment);
        Ok(url)
    }
}

impl std::fmt::Debug for SheetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetFetcher")
            .field("api_base", &self.api_base)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Flattens a JSON cell to text, normalizing hyperlink formulas.
fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_cell(s),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
