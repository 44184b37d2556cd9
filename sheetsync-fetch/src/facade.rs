//! Entity-level entry point used by callers.
//!
//! [`SyncFacade`] owns the shared limiter, token provider and cache for one
//! process and turns sheet rows into entities. The plain operations collapse
//! every failure to an empty list or `false`; the `load_`/`try_` siblings
//! return the failure instead.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use sheetsync_core::{format_row, Entity, EntityKind, RowTransformer};
use sheetsync_store::{CacheStorage, FileStorage, MemoryStorage, ResponseCache, SyncConfig};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::credentials::CredentialStore;
use crate::error::FetchError;
use crate::fetcher::SheetFetcher;
use crate::host::http::{HttpClient, HttpTransport};
use crate::rate_limit::RateLimiter;
use crate::token::TokenProvider;

/// Reads and appends entities through one shared token, quota and cache.
pub struct SyncFacade {
    config: SyncConfig,
    cache: Arc<ResponseCache>,
    tokens: Arc<TokenProvider>,
    fetcher: SheetFetcher,
    last_loaded: RwLock<HashMap<EntityKind, DateTime<Utc>>>,
}

impl SyncFacade {
    /// Creates a facade using the production HTTP client and the credentials
    /// found through the configured lookup chain.
    ///
    /// The client only talks to the hosts of the API base and token endpoint.
    pub fn from_config(config: SyncConfig) -> Self {
        let credentials = CredentialStore::load(config.credentials_path.as_deref());
        let client = HttpClient::new().with_allowed_domains(allowed_hosts(&config));
        Self::new(config, credentials, Arc::new(client))
    }

    /// Creates a facade over the given credentials and transport.
    ///
    /// Cache entries persist under `config.cache_dir` when set, otherwise
    /// only in memory.
    pub fn new(
        config: SyncConfig,
        credentials: CredentialStore,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let storage: Arc<dyn CacheStorage> = match &config.cache_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_cache(config, credentials, transport, Arc::new(ResponseCache::new(storage)))
    }

    /// Creates a facade sharing an existing cache.
    pub fn with_cache(
        config: SyncConfig,
        credentials: CredentialStore,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        let tokens = Arc::new(TokenProvider::from_config(
            &config,
            credentials,
            transport.clone(),
            cache.clone(),
        ));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let fetcher =
            SheetFetcher::from_config(&config, transport, tokens.clone(), limiter, cache.clone());

        Self {
            config,
            cache,
            tokens,
            fetcher,
            last_loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns true if usable credentials were loaded.
    pub fn is_available(&self) -> bool {
        self.tokens.is_available()
    }

    /// Returns the entities of `kind`, or an empty list on any failure.
    pub async fn fetch_entities(&self, kind: EntityKind) -> Vec<Entity> {
        match self.load_entities(kind).await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Entity fetch failed");
                Vec::new()
            }
        }
    }

    /// Returns the entities of `kind`, or the reason they could not be read.
    #[instrument(skip(self))]
    pub async fn load_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, FetchError> {
        if let Some(entities) = self
            .cache
            .get::<Vec<Entity>>(kind.cache_key(), &self.config.cache_version, self.config.cache.entity_ttl())
            .await
        {
            debug!(count = entities.len(), "Serving entities from cache");
            return Ok(entities);
        }

        let resource = self.config.resource(kind);
        if !resource.is_configured() {
            return Err(FetchError::NotConfigured(kind));
        }

        let rows = self
            .fetcher
            .fetch_rows(&resource.spreadsheet_id, &resource.range)
            .await?;
        let entities = RowTransformer::transform_sheet(kind, &rows);

        if !entities.is_empty() {
            if let Err(e) = self
                .cache
                .set(kind.cache_key(), &entities, &self.config.cache_version)
                .await
            {
                warn!(error = %e, "Failed to cache entities");
            }
        }
        self.last_loaded.write().await.insert(kind, Utc::now());

        info!(count = entities.len(), "Loaded entities");
        Ok(entities)
    }

    /// Loads every kind concurrently.
    pub async fn fetch_all(&self) -> HashMap<EntityKind, Vec<Entity>> {
        let loads = EntityKind::all()
            .iter()
            .map(|&kind| async move { (kind, self.fetch_entities(kind).await) });
        join_all(loads).await.into_iter().collect()
    }

    /// Appends one entity, returning false on any failure.
    pub async fn submit_entity(&self, entity: &Entity) -> bool {
        match self.try_submit_entity(entity).await {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = %entity.kind(), name = %entity.name(), error = %e, "Submit failed");
                false
            }
        }
    }

    /// Appends one entity as a row of its kind's sheet.
    ///
    /// Not retried. On success the kind's cached rows and entities are dropped.
    #[instrument(skip(self, entity), fields(kind = %entity.kind(), name = %entity.name()))]
    pub async fn try_submit_entity(&self, entity: &Entity) -> Result<(), FetchError> {
        let kind = entity.kind();
        let resource = self.config.resource(kind);
        if !resource.is_configured() {
            return Err(FetchError::NotConfigured(kind));
        }

        let range = if resource.append_range.trim().is_empty() {
            &resource.range
        } else {
            &resource.append_range
        };

        let row = format_row(entity);
        self.fetcher
            .append(&resource.spreadsheet_id, range, &[row])
            .await?;

        self.invalidate(kind).await;
        Ok(())
    }

    /// Performs a token exchange to verify credentials and endpoint.
    pub async fn check(&self) -> Result<(), FetchError> {
        self.tokens.invalidate().await;
        self.tokens.try_access_token().await.map(|_| ())
    }

    /// Drops the cached entities and rows of `kind`.
    pub async fn invalidate(&self, kind: EntityKind) {
        let resource = self.config.resource(kind);
        self.cache.remove(kind.cache_key()).await;
        self.fetcher
            .invalidate(&resource.spreadsheet_id, &resource.range)
            .await;
        debug!(kind = %kind, "Invalidated cache");
    }

    /// Wipes every cache entry, including the access token.
    pub async fn clear_cache(&self) -> Result<(), FetchError> {
        self.cache.clear().await?;
        Ok(())
    }

    /// Returns when entities of `kind` were last read from the sheet.
    pub async fn last_loaded(&self, kind: EntityKind) -> Option<DateTime<Utc>> {
        self.last_loaded.read().await.get(&kind).copied()
    }
}

/// Hosts the configured endpoints live on.
fn allowed_hosts(config: &SyncConfig) -> Vec<String> {
    [&config.api_base, &config.token_endpoint]
        .into_iter()
        .filter_map(|endpoint| Url::parse(endpoint).ok()?.host_str().map(str::to_string))
        .collect()
}

impl std::fmt::Debug for SyncFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncFacade")
            .field("fetcher", &self.fetcher)
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}
