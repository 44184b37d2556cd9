//! Service-account credentials.
//!
//! Credentials are loaded once at startup and never change afterwards.
//!
//! ## Credential Sources
//!
//! 1. An explicit path from the configuration
//! 2. `SHEETSYNC_CREDENTIALS` - path to a service-account JSON file
//! 3. `GOOGLE_APPLICATION_CREDENTIALS` - standard Google override
//! 4. `<config dir>/sheetsync/service_account.json`

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;

/// Marker every PEM private key carries.
const PRIVATE_KEY_MARKER: &str = "PRIVATE KEY-----";

/// Credential type of service-account key files.
const SERVICE_ACCOUNT_TYPE: &str = "service_account";

// ============================================================================
// Credential Paths
// ============================================================================

/// Get all possible credential paths, in priority order.
pub fn credential_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(path) = explicit {
        paths.push(path.to_path_buf());
    }

    for var in ["SHEETSYNC_CREDENTIALS", "GOOGLE_APPLICATION_CREDENTIALS"] {
        if let Ok(path) = std::env::var(var) {
            if !path.trim().is_empty() {
                paths.push(PathBuf::from(path));
            }
        }
    }

    if let Some(config) = dirs::config_dir() {
        paths.push(config.join("sheetsync").join("service_account.json"));
    }

    paths
}

// ============================================================================
// Credentials
// ============================================================================

/// Service-account credentials as found in a Google key file.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Service-account email, used as JWT issuer and subject.
    #[serde(rename = "client_email")]
    pub issuer_email: String,

    /// PEM-encoded PKCS#8 RSA private key.
    pub private_key: String,

    /// Id of the key, sent as the JWT `kid`.
    #[serde(rename = "private_key_id", default)]
    pub key_id: String,

    /// Token endpoint named in the key file.
    #[serde(default)]
    pub token_uri: Option<String>,

    /// Credential type (`service_account`).
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
}

impl Credentials {
    /// Parses and validates service-account JSON.
    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        let mut creds: Credentials =
            serde_json::from_str(json).map_err(|e| FetchError::Credential(e.to_string()))?;

        // Keys pasted through env files often arrive with literal "\n".
        if creds.private_key.contains("\\n") {
            creds.private_key = creds.private_key.replace("\\n", "\n");
        }

        creds.validate()?;
        Ok(creds)
    }

    /// Reads and parses a service-account JSON file.
    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FetchError::Credential(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), FetchError> {
        if self.issuer_email.trim().is_empty() {
            return Err(FetchError::Credential("client_email is empty".to_string()));
        }
        if !self.private_key.contains(PRIVATE_KEY_MARKER) {
            return Err(FetchError::Credential(
                "private_key is not a PEM private key".to_string(),
            ));
        }
        if let Some(kind) = self.credential_type.as_deref() {
            if kind != SERVICE_ACCOUNT_TYPE {
                return Err(FetchError::Credential(format!(
                    "expected a {SERVICE_ACCOUNT_TYPE} key, found {kind}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("issuer_email", &self.issuer_email)
            .field("key_id", &self.key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Credential Store
// ============================================================================

/// Holds the credentials loaded at startup, or the reason none are available.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials: Result<Credentials, String>,
}

impl CredentialStore {
    /// Wraps already-parsed credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Ok(credentials),
        }
    }

    /// A store with no credentials.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            credentials: Err(reason.into()),
        }
    }

    /// Parses inline service-account JSON.
    pub fn from_json(json: &str) -> Self {
        match Credentials::from_json(json) {
            Ok(creds) => Self::new(creds),
            Err(e) => {
                warn!(error = %e, "Invalid service-account JSON");
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Loads credentials from the first existing credential file.
    ///
    /// Never fails; check [`is_available`](Self::is_available).
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Self {
        for path in credential_paths(explicit) {
            if !path.exists() {
                continue;
            }
            debug!(path = %path.display(), "Found credentials file");

            return match Credentials::from_file(&path) {
                Ok(creds) => {
                    info!(issuer = %creds.issuer_email, "Loaded service-account credentials");
                    Self::new(creds)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unusable credentials file");
                    Self::unavailable(e.to_string())
                }
            };
        }

        Self::unavailable("no service-account credentials found")
    }

    /// Returns true if usable credentials were loaded.
    pub fn is_available(&self) -> bool {
        self.credentials.is_ok()
    }

    /// Returns the credentials, or a [`FetchError::Credential`] explaining their absence.
    pub fn credentials(&self) -> Result<&Credentials, FetchError> {
        self.credentials
            .as_ref()
            .map_err(|reason| FetchError::Credential(reason.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================
