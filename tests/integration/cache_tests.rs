//! Integration tests for the proxy cache coordinator
//!
//! A wiremock server plays the proxy; a temporary directory plays its
//! on-disk cache tree.

use cache_crawler::cache::{CacheCoordinator, CacheError, CacheStore, PurgeOutcome, RenewOutcome, ShardLevels};
use cache_crawler::config::CrawlerConfig;
use cache_crawler::crawler::Fetcher;
use std::path::PathBuf;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_coordinator(root: &TempDir) -> CacheCoordinator {
    let config = CrawlerConfig {
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..Default::default()
    };
    let fetcher = Fetcher::from_config(&config).expect("Failed to build fetcher");
    let store = CacheStore::new(
        root.path().join("cache"),
        root.path().join("temp"),
        ShardLevels::OneTwo,
    );
    CacheCoordinator::new(fetcher, store)
}

/// Writes a cache entry for `url` and returns its path
fn seed_cache_entry(coordinator: &CacheCoordinator, url: &Url, body: &[u8]) -> PathBuf {
    let entry = coordinator.store().entry_path(url);
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, body).unwrap();
    entry
}

/// A URL on a port nothing listens on
fn unreachable_url(page: &str) -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{}{}", port, page)).unwrap()
}

fn page_url(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).unwrap()
}

#[tokio::test]
async fn test_purge_not_found_is_success() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("PURGE"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = create_coordinator(&root);
    let outcome = coordinator.purge(&page_url(&mock_server, "/gone")).await;

    assert_eq!(outcome.unwrap(), PurgeOutcome::AlreadyPurged);
}

#[tokio::test]
async fn test_purge_ok() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("PURGE"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Successful purge"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = create_coordinator(&root);
    let outcome = coordinator.purge(&page_url(&mock_server, "/page")).await;

    assert_eq!(outcome.unwrap(), PurgeOutcome::Purged);
}

#[tokio::test]
async fn test_purge_server_error_is_protocol_error() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("PURGE"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let coordinator = create_coordinator(&root);
    let result = coordinator.purge(&page_url(&mock_server, "/page")).await;

    assert!(matches!(
        result,
        Err(CacheError::Protocol { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_purge_unreachable_is_transport_error() {
    let root = TempDir::new().unwrap();
    let coordinator = create_coordinator(&root);

    let result = coordinator.purge(&unreachable_url("/page")).await;

    assert!(matches!(result, Err(CacheError::Transport { .. })));
}

#[tokio::test]
async fn test_renew_without_entry_has_no_side_effects() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coordinator = create_coordinator(&root);
    let url = page_url(&mock_server, "/uncached");

    assert_eq!(
        coordinator.try_renew(&url).await.unwrap(),
        RenewOutcome::NotCached
    );
    assert!(!coordinator.renew(&url).await);
    assert!(!root.path().join("temp").exists());
}

#[tokio::test]
async fn test_renew_success_discards_held_entry() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = create_coordinator(&root);
    let url = page_url(&mock_server, "/page");
    let entry = seed_cache_entry(&coordinator, &url, b"stale");

    assert!(coordinator.renew(&url).await);
    assert!(!coordinator.store().holding_path(&url).exists());
    // The mock proxy writes no fresh entry, so the old one is simply gone
    assert!(!entry.exists());
}

#[tokio::test]
async fn test_renew_rolls_back_on_transport_error() {
    let root = TempDir::new().unwrap();
    let coordinator = create_coordinator(&root);
    let url = unreachable_url("/page");
    let original = b"KEY: httpGET127.0.0.1/page\r\n\r\n<html>cached</html>".to_vec();
    let entry = seed_cache_entry(&coordinator, &url, &original);

    assert_eq!(
        coordinator.try_renew(&url).await.unwrap(),
        RenewOutcome::RolledBack
    );

    assert_eq!(std::fs::read(&entry).unwrap(), original);
    assert!(!coordinator.store().holding_path(&url).exists());
}

#[tokio::test]
async fn test_renew_rolls_back_on_http_error() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let coordinator = create_coordinator(&root);
    let url = page_url(&mock_server, "/broken");
    let entry = seed_cache_entry(&coordinator, &url, b"last good copy");

    assert!(!coordinator.renew(&url).await);
    assert_eq!(std::fs::read(&entry).unwrap(), b"last good copy");
    assert!(!coordinator.store().holding_path(&url).exists());
}

#[tokio::test]
async fn test_https_url_shares_cache_entry_with_http() {
    let root = TempDir::new().unwrap();
    let coordinator = create_coordinator(&root);

    let http = Url::parse("http://example.com/about").unwrap();
    let https = Url::parse("https://example.com/about").unwrap();

    assert_eq!(
        coordinator.store().entry_path(&http),
        coordinator.store().entry_path(&https)
    );
    assert!(coordinator
        .store()
        .entry_path(&http)
        .ends_with("9/49/1abdcf5226e74b2b33920fb0fda13499"));
}
