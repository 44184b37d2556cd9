//! Fetch error types.
//!
//! [`FetchError`] covers every failure between loading credentials and
//! decoding a sheet response. Callers of the convenience operations never
//! see these; they are collapsed to `None`, `false` or an empty list at the
//! public boundary. The `Result`-returning operations expose them.

use std::fmt;

use sheetsync_core::EntityKind;
use sheetsync_store::StoreError;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credentials are missing or cannot be parsed.
    #[error("Credentials unavailable: {0}")]
    Credential(String),

    /// The private key could not be imported or signing failed.
    #[error("Signing failed: {0}")]
    Crypto(String),

    /// The token endpoint rejected the assertion.
    #[error("Token exchange rejected ({kind}): {message}")]
    Auth {
        /// Classified rejection reason.
        kind: TokenFailureKind,
        /// HTTP status of the rejection.
        status: u16,
        /// Upstream error description.
        message: String,
    },

    /// The API answered HTTP 429.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait, when the API said so.
        retry_after: Option<u64>,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transient(String),

    /// The API answered with an unexpected status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// A response could not be decoded.
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// All attempts failed.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// The last failure.
        last: Box<FetchError>,
    },

    /// No spreadsheet is configured for the entity kind.
    #[error("No spreadsheet configured for {0}")]
    NotConfigured(EntityKind),

    /// The request could not be issued at all.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Cache storage failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl FetchError {
    /// Returns true if a later attempt of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::Transient(_) | FetchError::Status { .. }
        )
    }

    /// Returns true if the failure is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

// ============================================================================
// Token Failure Kind
// ============================================================================

/// Why the token endpoint rejected an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailureKind {
    /// The assertion's audience does not match the endpoint.
    AudienceMismatch,
    /// The assertion's `iat`/`exp` are outside the accepted window.
    ExpiredAssertion,
    /// The signature did not verify against the registered key.
    InvalidSignature,
    /// The service account or key is unknown or disabled.
    InvalidClient,
    /// Anything else.
    Other,
}

impl TokenFailureKind {
    /// Classifies an OAuth error response from its `error` and `error_description` fields.
    pub fn classify(error: Option<&str>, description: Option<&str>) -> Self {
        let error = error.unwrap_or_default().to_lowercase();
        let description = description.unwrap_or_default().to_lowercase();

        if description.contains("audience") {
            Self::AudienceMismatch
        } else if description.contains("signature") {
            Self::InvalidSignature
        } else if description.contains("timeframe")
            || description.contains("expired")
            || description.contains("not yet valid")
        {
            Self::ExpiredAssertion
        } else if error == "invalid_client" || error == "unauthorized_client" {
            Self::InvalidClient
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for TokenFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AudienceMismatch => "audience mismatch",
            Self::ExpiredAssertion => "expired assertion",
            Self::InvalidSignature => "invalid signature",
            Self::InvalidClient => "invalid client",
            Self::Other => "rejected",
        };
        f.write_str(text)
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout.
    #[error("Request timed out")]
    Timeout,

    /// Connection-level failure reported by a non-reqwest transport.
    #[error("Connection failed: {0}")]
    Connection(String),
}

impl HttpError {
    /// Returns true if the request may succeed when repeated.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Request(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            HttpError::Timeout | HttpError::Connection(_) => true,
            HttpError::DomainNotAllowed(_) | HttpError::InvalidUrl(_) => false,
        }
    }
}

/// Maps a transport failure to the fetch taxonomy.
pub(crate) fn classify_http_error(err: HttpError) -> FetchError {
    if err.is_transient() {
        FetchError::Transient(err.to_string())
    } else {
        FetchError::Http(err)
    }
}
