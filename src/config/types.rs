use crate::cache::ShardLevels;
use serde::Deserialize;
use std::path::PathBuf;

/// Default size of the request permit pool
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 20;

/// Main configuration structure for Cache-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of in-flight HTTP requests (GET and PURGE share the pool)
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: usize,

    /// Whole-request timeout applied by the transport (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("cache-crawler/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Proxy cache store layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root of the proxy's sharded cache tree
    #[serde(rename = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Root mirroring the cache tree for entries held during a renew
    #[serde(rename = "temp-dir")]
    pub temp_dir: PathBuf,

    /// Directory sharding scheme of the cache tree
    pub levels: ShardLevels,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("/root/nginx/cache"),
            temp_dir: PathBuf::from("/tmp/cache"),
            levels: ShardLevels::default(),
        }
    }
}
