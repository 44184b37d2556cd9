//! OAuth2 access tokens for the service account.
//!
//! Tokens come from exchanging a signed JWT assertion at the token
//! endpoint and are cached for less than the assertion's one-hour life.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetsync_store::{ResponseCache, SyncConfig};
use tracing::{debug, info, instrument, warn};

use crate::credentials::CredentialStore;
use crate::error::{classify_http_error, FetchError, TokenFailureKind};
use crate::host::http::HttpTransport;
use crate::jwt::{JwtSigner, DEFAULT_AUDIENCE, DEFAULT_SCOPE};

/// Cache key of the access token.
pub const TOKEN_CACHE_KEY: &str = "oauth_token";

/// Grant type of the service-account assertion flow.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Default token lifetime in the cache.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

/// Slack kept between the cached lifetime and the server-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Cached form of a token, carrying the instant it stops being used.
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    expires_at: DateTime<Utc>,
}

/// Returns how long a token may be reused: the configured TTL, shortened
/// to `expires_in` minus [`EXPIRY_MARGIN`] when the server reports one.
fn cache_lifetime(ttl: Duration, expires_in: Option<u64>) -> Duration {
    match expires_in {
        Some(secs) => ttl.min(Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN)),
        None => ttl,
    }
}

/// Error body of a rejected exchange.
#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Supplies cached access tokens, exchanging a fresh assertion on a miss.
pub struct TokenProvider {
    credentials: CredentialStore,
    signer: JwtSigner,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResponseCache>,
    token_endpoint: String,
    cache_version: String,
    ttl: Duration,
}

impl TokenProvider {
    /// Creates a provider for Google's token endpoint with default settings.
    pub fn new(
        credentials: CredentialStore,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            credentials,
            signer: JwtSigner::new(DEFAULT_AUDIENCE, DEFAULT_SCOPE),
            transport,
            cache,
            token_endpoint: DEFAULT_AUDIENCE.to_string(),
            cache_version: "1".to_string(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Creates a provider using the endpoint, scope and TTL from `config`.
    pub fn from_config(
        config: &SyncConfig,
        credentials: CredentialStore,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            credentials,
            signer: JwtSigner::new(&config.token_endpoint, &config.scope),
            transport,
            cache,
            token_endpoint: config.token_endpoint.clone(),
            cache_version: config.cache_version.clone(),
            ttl: config.cache.token_ttl(),
        }
    }

    /// Returns true if credentials are available to request tokens with.
    pub fn is_available(&self) -> bool {
        self.credentials.is_available()
    }

    /// Returns an access token, or `None` when one cannot be obtained.
    pub async fn access_token(&self) -> Option<String> {
        match self.try_access_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "No access token available");
                None
            }
        }
    }

    /// Returns an access token or the reason none could be obtained.
    #[instrument(skip(self))]
    pub async fn try_access_token(&self) -> Result<String, FetchError> {
        if let Some(cached) = self
            .cache
            .get::<CachedToken>(TOKEN_CACHE_KEY, &self.cache_version, self.ttl)
            .await
        {
            if Utc::now() < cached.expires_at {
                debug!("Using cached access token");
                return Ok(cached.access_token);
            }
            debug!("Cached access token is past its reported expiry");
            self.cache.remove(TOKEN_CACHE_KEY).await;
        }

        let credentials = self.credentials.credentials()?;
        let assertion = self.signer.sign(credentials, Utc::now())?;

        info!(issuer = %credentials.issuer_email, "Exchanging assertion for access token");

        let response = self
            .transport
            .post_form(
                &self.token_endpoint,
                &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
            )
            .await
            .map_err(classify_http_error)?;

        if !response.is_success() {
            let body: TokenErrorResponse = response.parse().unwrap_or_default();
            let kind = TokenFailureKind::classify(
                body.error.as_deref(),
                body.error_description.as_deref(),
            );
            warn!(status = response.status, reason = %kind, "Token exchange rejected");

            return Err(FetchError::Auth {
                kind,
                status: response.status,
                message: body
                    .error_description
                    .or(body.error)
                    .unwrap_or_else(|| response.body_excerpt()),
            });
        }

        let token: TokenResponse = response
            .parse()
            .map_err(|e| FetchError::MalformedData(format!("token response: {e}")))?;

        let lifetime = cache_lifetime(self.ttl, token.expires_in);
        if lifetime.is_zero() {
            debug!(expires_in = ?token.expires_in, "Token expires too soon to cache");
        } else {
            let cached = CachedToken {
                access_token: token.access_token.clone(),
                expires_at: Utc::now()
                    + chrono::Duration::from_std(lifetime).unwrap_or(chrono::Duration::zero()),
            };
            if let Err(e) = self
                .cache
                .set(TOKEN_CACHE_KEY, &cached, &self.cache_version)
                .await
            {
                warn!(error = %e, "Failed to persist access token");
            }
        }

        debug!("Obtained access token");
        Ok(token.access_token)
    }

    /// Drops the cached token so the next call performs a new exchange.
    pub async fn invalidate(&self) {
        self.cache.remove(TOKEN_CACHE_KEY).await;
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_endpoint", &self.token_endpoint)
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
