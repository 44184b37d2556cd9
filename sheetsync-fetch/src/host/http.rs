//! HTTP transport with tracing and domain allowlist.
//!
//! Everything the client sends goes through [`HttpTransport`], which
//! returns the status and body rather than failing on non-2xx answers;
//! status handling belongs to the callers. [`HttpClient`] is the reqwest
//! implementation.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for SheetSync.
const USER_AGENT: &str = concat!("SheetSync/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt kept for diagnostics.
const BODY_EXCERPT_LEN: usize = 512;

// ============================================================================
// Transport Response
// ============================================================================

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// `Retry-After` header in seconds, when present.
    pub retry_after: Option<u64>,
}

impl TransportResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Creates a response with a JSON body.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Decodes the body as JSON.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Returns the start of the body, for logs and errors.
    pub fn body_excerpt(&self) -> String {
        self.body.chars().take(BODY_EXCERPT_LEN).collect()
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// The HTTP operations the client needs.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET with a bearer token.
    async fn get(&self, url: &str, bearer: &str) -> Result<TransportResponse, HttpError>;

    /// POST a form-encoded body without authorization.
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TransportResponse, HttpError>;

    /// POST a JSON body with a bearer token.
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, HttpError>;
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This should only occur
    /// if the system's TLS/SSL configuration is fundamentally broken,
    /// making network operations impossible.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to create HTTP client: {}. \
                    This usually indicates a broken TLS/SSL configuration.",
                    e
                )
            });

        Self {
            inner: client,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains and their subdomains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{}", domain)));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    async fn into_transport_response(response: Response) -> Result<TransportResponse, HttpError> {
        let status = response.status().as_u16();
        let retry_after = response.retry_after_secs();
        let body = response.text().await?;
        debug!(status, "Response received");

        Ok(TransportResponse {
            status,
            body,
            retry_after,
        })
    }

    fn map_send_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(err)
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    #[instrument(skip(self, bearer), fields(url = %url))]
    async fn get(&self, url: &str, bearer: &str) -> Result<TransportResponse, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request with auth");

        let response = self
            .inner
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::into_transport_response(response).await
    }

    #[instrument(skip(self, form), fields(url = %url))]
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TransportResponse, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("POST request with form data");

        let response = self
            .inner
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::into_transport_response(response).await
    }

    #[instrument(skip(self, bearer, body), fields(url = %url))]
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("POST request with JSON");

        let response = self
            .inner
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::into_transport_response(response).await
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================
