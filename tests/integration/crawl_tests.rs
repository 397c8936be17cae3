//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use cache_crawler::config::Config;
use cache_crawler::crawler::{CrawlEngine, CrawlOptions};
use cache_crawler::{AllowedDomains, CacheStore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with cache roots inside `root`
fn create_test_config(root: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_requests = 4;
    config.crawler.request_timeout_secs = 5;
    config.crawler.connect_timeout_secs = 2;
    config.cache.cache_dir = root.path().join("cache");
    config.cache.temp_dir = root.path().join("temp");
    config
}

/// `host:port` of the mock server, as compared against the allow-list
fn mock_authority(server: &MockServer) -> String {
    let url = Url::parse(&server.uri()).expect("Failed to parse mock server URI");
    format!(
        "{}:{}",
        url.host_str().expect("Mock server URI has no host"),
        url.port().expect("Mock server URI has no port")
    )
}

fn page_url(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).expect("Failed to build page URL")
}

/// Every regular file below `dir`; empty when `dir` does not exist
fn files_under(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// Writes a proxy cache entry for `url` under the configured cache root
fn seed_cache_entry(config: &Config, url: &Url, body: &[u8]) -> PathBuf {
    let entry = CacheStore::from_config(&config.cache).entry_path(url);
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, body).unwrap();
    entry
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_same_domain_crawl_drops_offsite_links() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/about">About</a>
                <a href="https://other.com/x">Elsewhere</a>
            </body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<html><body>No links here</body></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&create_test_config(&root), options).unwrap();
    let report = engine.run(page_url(&mock_server, "/")).await;

    assert_eq!(
        engine.visited().sorted(),
        vec![
            page_url(&mock_server, "/").to_string(),
            page_url(&mock_server, "/about").to_string(),
        ]
    );
    assert_eq!(report.visited(), 2);
    assert_eq!(report.failed(), 0);
    assert!(engine.frontier().is_empty());
}

#[tokio::test]
async fn test_each_url_fetched_once_despite_cycles() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a">A</a><a href="/b">B</a><a href="/">Home</a>"#.to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">Home</a><a href="/b">B</a>"#.to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(r#"<a href="/a">A</a><a href="/">Home</a>"#.to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&create_test_config(&root), options).unwrap();
    let report = engine.run(page_url(&mock_server, "/")).await;

    assert_eq!(engine.visited().len(), 3);
    assert_eq!(report.visited(), 3);
    assert!(report.skipped() >= 1, "rediscovered pages should be skipped");
}

#[tokio::test]
async fn test_failed_fetch_is_not_visited() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/missing">Gone</a><a href="/ok">Fine</a>"#.to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>ok</p>".to_string()))
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&create_test_config(&root), options).unwrap();
    let report = engine.run(page_url(&mock_server, "/")).await;

    assert!(!engine
        .visited()
        .contains(&page_url(&mock_server, "/missing")));
    assert_eq!(engine.visited().len(), 2);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_unreachable_seed_completes_with_empty_visited_set() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let root = TempDir::new().unwrap();
    let mut engine = CrawlEngine::new(&create_test_config(&root), CrawlOptions::default()).unwrap();
    let seed = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    let report = engine.run(seed).await;

    assert!(engine.visited().is_empty());
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_css_asset_links_follow_same_host_rule() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                format!(
                    r#"@font-face {{ src: url("https://{}/font.woff"); }}
                    body {{ background: url("https://cdn.other.com/bg.png"); }}"#,
                    mock_authority(&mock_server)
                ),
                "text/css",
            ),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/font.woff"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2, 3], "font/woff"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    // No --domains: text-mode extraction does not consult the allow-list
    let mut engine = CrawlEngine::new(&create_test_config(&root), CrawlOptions::default()).unwrap();
    engine.run(page_url(&mock_server, "/style.css")).await;

    assert_eq!(
        engine.visited().sorted(),
        vec![
            page_url(&mock_server, "/font.woff").to_string(),
            page_url(&mock_server, "/style.css").to_string(),
        ]
    );
}

#[tokio::test]
async fn test_markup_without_domains_stays_on_seed() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("about".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut engine = CrawlEngine::new(&create_test_config(&root), CrawlOptions::default()).unwrap();
    let report = engine.run(page_url(&mock_server, "/")).await;

    assert_eq!(report.visited(), 1);
}

#[tokio::test]
async fn test_clean_cache_purges_after_each_fetch() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("about".to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("PURGE"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Nothing cached for /about: the proxy answers 404
    Mock::given(method("PURGE"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        clean_cache_after_fetch: true,
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&create_test_config(&root), options).unwrap();
    let report = engine.run(page_url(&mock_server, "/")).await;

    assert_eq!(report.visited(), 2);
    assert_eq!(report.purged, 2);
}

#[tokio::test]
async fn test_failed_purge_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("about".to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("PURGE"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        clean_cache_after_fetch: true,
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&create_test_config(&root), options).unwrap();
    let report = engine.run(page_url(&mock_server, "/")).await;

    assert_eq!(report.visited(), 2);
    assert_eq!(report.purged, 0);
}

#[tokio::test]
async fn test_purge_before_fetch_renews_cached_entry() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);
    let store = CacheStore::from_config(&config.cache);
    let seed = page_url(&mock_server, "/");

    let entry = store.entry_path(&seed);
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, b"stale entry").unwrap();

    // One GET from the renew, one from the crawl itself
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>fresh</p>".to_string()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        purge_before_fetch: true,
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&config, options).unwrap();
    let report = engine.run(seed.clone()).await;

    assert_eq!(report.renewed, 1);
    assert_eq!(report.visited(), 1);
    assert!(!store.holding_path(&seed).exists());
}

#[tokio::test]
async fn test_https_seed_is_downgraded() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>home</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let seed = Url::parse(&format!("https://{}/", mock_authority(&mock_server))).unwrap();
    let mut engine = CrawlEngine::new(&create_test_config(&root), CrawlOptions::default()).unwrap();
    let report = engine.run(seed).await;

    assert_eq!(report.seed, page_url(&mock_server, "/").to_string());
    assert_eq!(
        engine.visited().sorted(),
        vec![page_url(&mock_server, "/").to_string()]
    );
}

#[tokio::test]
async fn test_purge_before_fetch_restores_entry_when_seed_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);
    let seed = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    let entry = seed_cache_entry(&config, &seed, b"KEY: httpGET127.0.0.1/\r\n\r\nlast good copy");

    let options = CrawlOptions {
        purge_before_fetch: true,
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&config, options).unwrap();
    let report = engine.run(seed).await;

    assert_eq!(
        std::fs::read(&entry).unwrap(),
        b"KEY: httpGET127.0.0.1/\r\n\r\nlast good copy"
    );
    assert_eq!(report.failed(), 1);
    assert_eq!(report.renewed, 0);
    assert!(engine.visited().is_empty());
    assert!(files_under(&config.cache.temp_dir).is_empty());
}

#[tokio::test]
async fn test_purge_before_fetch_restores_entry_on_server_error() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);
    let seed = page_url(&mock_server, "/");
    let entry = seed_cache_entry(&config, &seed, b"last good copy");

    // One GET from the renew, one from the crawl itself
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&mock_server)
        .await;

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new([mock_authority(&mock_server)]),
        purge_before_fetch: true,
        ..Default::default()
    };
    let mut engine = CrawlEngine::new(&config, options).unwrap();
    let report = engine.run(seed).await;

    assert_eq!(std::fs::read(&entry).unwrap(), b"last good copy");
    assert_eq!(report.failed(), 1);
    assert_eq!(report.renewed, 0);
    assert!(engine.visited().is_empty());
    assert!(files_under(&config.cache.temp_dir).is_empty());
}
