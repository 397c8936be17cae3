//! Proxy cache integration
//!
//! This module mirrors the reverse proxy's on-disk cache so the crawler can
//! force cache misses and invalidate entries:
//! - Cache key and shard path derivation
//! - The cache store with scoped relocation of entries
//! - Purge and renew operations against the proxy

mod coordinator;
mod key;
mod store;

pub use coordinator::{CacheCoordinator, PurgeOutcome, RenewOutcome};
pub use key::{cache_key, key_digest, shard_path, ShardLevels};
pub use store::{CacheStore, HeldEntry};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Purge of {url} rejected with HTTP {status}")]
    Protocol { url: String, status: u16 },

    #[error("Purge request for {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error(
        "Failed to restore held cache entry {} to {}: {source}",
        .held.display(),
        .original.display()
    )]
    RollbackFailed {
        held: PathBuf,
        original: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;
