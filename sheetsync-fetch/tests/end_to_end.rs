//! End-to-end tests for the sync client over a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sheetsync_core::EntityKind;
use sheetsync_fetch::{
    CredentialStore, FetchError, Method, RateLimiter, ScriptedTransport, SheetFetcher, SyncFacade,
    TokenProvider, TransportResponse,
};
use sheetsync_store::{ResponseCache, SyncConfig};
use tempfile::TempDir;

const FIXTURE: &str = include_str!("fixtures/service_account.json");

fn config() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.tools.spreadsheet_id = "tools-sheet".to_string();
    config.patterns.spreadsheet_id = "patterns-sheet".to_string();
    config
}

fn token_reply(transport: &ScriptedTransport) {
    transport.push(
        Method::PostForm,
        "oauth2.googleapis.com/token",
        TransportResponse::json(200, &json!({"access_token": "ya29.test", "expires_in": 3599, "token_type": "Bearer"})),
    );
}

#[tokio::test]
async fn test_only_external_tools_are_returned() {
    let transport = Arc::new(ScriptedTransport::new());
    token_reply(&transport);
    transport.push(
        Method::Get,
        "/tools-sheet/values/",
        TransportResponse::json(
            200,
            &json!({
                "range": "Tools!A1:F3",
                "majorDimension": "ROWS",
                "values": [
                    ["Name", "Description", "URL", "Source", "Discipline", "Notes"],
                    ["Figma", "Design tool", "figma.com", "external", " Design , Prototyping ,, ", ""],
                    ["Wiki", "Internal docs", "wiki.local", "internal", "Docs"],
                ]
            }),
        ),
    );

    let facade = SyncFacade::new(config(), CredentialStore::from_json(FIXTURE), transport.clone());
    let entities = facade.fetch_entities(EntityKind::Tool).await;

    assert_eq!(entities.len(), 1);
    let tool = entities[0].as_tool().unwrap();
    assert_eq!(tool.name, "Figma");
    assert_eq!(tool.url, "https://figma.com");
    assert_eq!(tool.discipline, vec!["Design", "Prototyping"]);

    assert_eq!(transport.count(Method::PostForm, "/token"), 1);
    let get = transport
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Get)
        .unwrap();
    assert_eq!(get.bearer.as_deref(), Some("ya29.test"));
    assert!(get.url.contains("valueRenderOption=FORMULA"));
    assert!(get.url.contains("majorDimension=ROWS"));

    let form = &transport.requests()[0].body;
    assert_eq!(form["grant_type"], "urn:ietf:params:oauth:grant-type:jwt-bearer");
    assert_eq!(form["assertion"].as_str().unwrap().split('.').count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_read_is_retried_then_cached() {
    let transport = Arc::new(ScriptedTransport::new());
    token_reply(&transport);
    transport.push(Method::Get, "/values/", TransportResponse::new(429, "Quota exceeded"));
    transport.push(
        Method::Get,
        "/values/",
        TransportResponse::json(200, &json!({"values": [["a", "b"], ["c"]]})),
    );

    let cache = Arc::new(ResponseCache::in_memory());
    let tokens = Arc::new(TokenProvider::new(
        CredentialStore::from_json(FIXTURE),
        transport.clone(),
        cache.clone(),
    ));
    let fetcher = SheetFetcher::new(transport.clone(), tokens, Arc::new(RateLimiter::default()), cache);

    let rows = fetcher.fetch("sheet-id", "Tools!A:F").await.unwrap();
    assert_eq!(rows, vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]);

    let cached = fetcher.fetch("sheet-id", "Tools!A:F").await.unwrap();
    assert_eq!(cached, rows);
    assert_eq!(transport.count(Method::Get, "/values/"), 2);
}

#[tokio::test]
async fn test_missing_credentials_fall_back_to_empty() {
    let transport = Arc::new(ScriptedTransport::new());
    let facade = SyncFacade::new(
        config(),
        CredentialStore::unavailable("no service account configured"),
        transport.clone(),
    );

    assert!(!facade.is_available());
    assert!(facade.fetch_entities(EntityKind::Pattern).await.is_empty());
    assert!(matches!(
        facade.load_entities(EntityKind::Pattern).await,
        Err(FetchError::Credential(_))
    ));
    assert!(facade.check().await.is_err());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let dir = TempDir::new().unwrap();
    let mut config = config();
    config.cache_dir = Some(dir.path().to_path_buf());

    let transport = Arc::new(ScriptedTransport::new());
    token_reply(&transport);
    transport.push(
        Method::Get,
        "/patterns-sheet/values/",
        TransportResponse::json(
            200,
            &json!({"values": [["Name"], ["Layout"], ["Grid", "web", "Rows and columns"]]}),
        ),
    );

    let first = SyncFacade::new(config.clone(), CredentialStore::from_json(FIXTURE), transport.clone());
    assert_eq!(first.fetch_entities(EntityKind::Pattern).await.len(), 2);
    drop(first);

    let second = SyncFacade::new(config, CredentialStore::from_json(FIXTURE), transport.clone());
    let entities = second.fetch_entities(EntityKind::Pattern).await;
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[1].as_pattern().unwrap().parent_title.as_deref(), Some("Layout"));
    assert!(second.last_loaded(EntityKind::Pattern).await.is_none());

    assert_eq!(transport.count(Method::Get, "/values/"), 1);
    assert_eq!(transport.count(Method::PostForm, "/token"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_reads_respect_min_interval() {
    let transport = Arc::new(ScriptedTransport::new());
    token_reply(&transport);
    for id in ["a", "b", "c"] {
        transport.push(
            Method::Get,
            &format!("/{id}/values/"),
            TransportResponse::json(200, &json!({"values": [[id]]})),
        );
    }

    let cache = Arc::new(ResponseCache::in_memory());
    let tokens = Arc::new(TokenProvider::new(
        CredentialStore::from_json(FIXTURE),
        transport.clone(),
        cache.clone(),
    ));
    let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(1), Duration::from_millis(100)));
    // Warm the token so concurrent reads share it.
    tokens.try_access_token().await.unwrap();
    let fetcher = Arc::new(SheetFetcher::new(transport.clone(), tokens, limiter, cache));

    let start = tokio::time::Instant::now();
    let handles: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|id| {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch(id, "A:A").await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    assert!(start.elapsed() >= Duration::from_secs(2));
}
