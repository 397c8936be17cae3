//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Downgrading every request URL from https to http
//! - Bounding in-flight requests with a shared permit pool
//! - GET fetches with fully drained bodies
//! - PURGE requests for the cache coordinator
//! - Error classification

use crate::config::CrawlerConfig;
use crate::url::downgrade_scheme;
use lazy_static::lazy_static;
use reqwest::{Client, Method, StatusCode};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

lazy_static! {
    /// Non-standard cache invalidation verb understood by the proxy
    static ref PURGE: Method = Method::from_bytes(b"PURGE").expect("PURGE is a valid method token");
}

/// Why a fetch produced no usable response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Connection, DNS or TLS level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport gave up waiting
    #[error("request timed out")]
    Timeout,

    /// The server answered outside 2xx/3xx
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The body could not be read to completion
    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchFailure {
    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested, after the scheme downgrade
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if present
    pub content_type: Option<String>,
    body: Vec<u8>,
}

impl FetchedPage {
    pub fn new(url: Url, status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            url,
            status,
            content_type,
            body,
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the body as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    Success(FetchedPage),
    Failure(FetchFailure),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Bounded-concurrency HTTP fetcher
///
/// Clones share the same client and permit pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    permits: Arc<Semaphore>,
}

impl Fetcher {
    /// Creates a fetcher allowing at most `max_concurrent` requests in flight
    pub fn new(client: Client, max_concurrent: usize) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Builds the client and permit pool from configuration
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, config.max_concurrent_requests))
    }

    /// Number of permits not currently held by a request
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Fetches a URL with GET
    ///
    /// # Request Flow
    ///
    /// 1. Downgrade https to http
    /// 2. Wait for a permit from the shared pool
    /// 3. Send the GET; any status outside 2xx/3xx is a failure
    /// 4. Drain the body before releasing the permit
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx/3xx, body read | Success |
    /// | other status | HttpStatus |
    /// | transport timeout | Timeout |
    /// | connect/DNS/TLS error | Transport |
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let mut url = url.clone();
        downgrade_scheme(&mut url);
        tracing::info!("Fetching {}", url);

        let Ok(_permit) = self.permits.acquire().await else {
            return FetchResult::Failure(FetchFailure::Transport(
                "request permit pool closed".to_string(),
            ));
        };

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let failure = FetchFailure::from_reqwest(&e);
                log_failure(&url, &failure);
                return FetchResult::Failure(failure);
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Read the body even for rejected statuses so the connection is reusable
        let body = response.bytes().await;

        if !(status.is_success() || status.is_redirection()) {
            let failure = FetchFailure::HttpStatus(status.as_u16());
            log_failure(&url, &failure);
            return FetchResult::Failure(failure);
        }

        match body {
            Ok(body) => FetchResult::Success(FetchedPage::new(
                url,
                status.as_u16(),
                content_type,
                body.to_vec(),
            )),
            Err(e) => {
                let failure = if e.is_timeout() {
                    FetchFailure::Timeout
                } else {
                    FetchFailure::Body(e.to_string())
                };
                log_failure(&url, &failure);
                FetchResult::Failure(failure)
            }
        }
    }

    /// Sends a `PURGE` for `url` and returns the status the proxy answered
    ///
    /// Shares the permit pool with [`Fetcher::fetch`]. Status interpretation
    /// is left to the caller.
    pub async fn purge(&self, url: &Url) -> Result<StatusCode, reqwest::Error> {
        let mut url = url.clone();
        downgrade_scheme(&mut url);

        let _permit = self.permits.acquire().await;
        let response = self.client.request(PURGE.clone(), url).send().await?;
        let status = response.status();
        let _ = response.bytes().await;

        Ok(status)
    }
}

fn log_failure(url: &Url, failure: &FetchFailure) {
    match failure {
        FetchFailure::Timeout => tracing::error!("Timeout error for {}", url),
        other => tracing::error!("Failed to fetch {}: {}", url, other),
    }
}
