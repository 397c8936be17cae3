//! On-disk view of the proxy cache tree
//!
//! The store only ever moves whole entry files between the live cache root
//! and a parallel holding root with the same relative layout. A held entry is
//! represented by [`HeldEntry`], which puts the file back on every exit path
//! that does not explicitly commit or roll back.

use crate::cache::key::{cache_key, shard_path};
use crate::cache::{CacheError, CacheResult, ShardLevels};
use crate::config::CacheConfig;
use std::path::{Path, PathBuf};
use url::Url;

/// Location and layout of the proxy cache
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    temp_dir: PathBuf,
    levels: ShardLevels,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>, levels: ShardLevels) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            temp_dir: temp_dir.into(),
            levels,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(&config.cache_dir, &config.temp_dir, config.levels)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Path of the live cache entry for a GET of `url`
    pub fn entry_path(&self, url: &Url) -> PathBuf {
        self.cache_dir.join(self.relative_path(url))
    }

    /// Path an entry for `url` occupies while held during a renew
    pub fn holding_path(&self, url: &Url) -> PathBuf {
        self.temp_dir.join(self.relative_path(url))
    }

    fn relative_path(&self, url: &Url) -> PathBuf {
        shard_path(&cache_key(url), self.levels)
    }

    /// Moves the live entry for `url` into the holding root
    ///
    /// Returns `Ok(None)` without touching the filesystem when no entry
    /// exists. On success the caller owns the returned guard and must settle
    /// it with [`HeldEntry::commit`] or [`HeldEntry::rollback`].
    pub async fn hold(&self, url: &Url) -> CacheResult<Option<HeldEntry>> {
        let original = self.entry_path(url);
        tracing::debug!("Cache file path: {}", original.display());

        let exists = tokio::fs::try_exists(&original)
            .await
            .map_err(|source| CacheError::Io {
                path: original.clone(),
                source,
            })?;
        if !exists {
            return Ok(None);
        }

        tracing::debug!("Cache file found for {}", original.display());
        let held = self.holding_path(url);
        if let Some(parent) = held.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::rename(&original, &held)
            .await
            .map_err(|source| CacheError::Io {
                path: original.clone(),
                source,
            })?;

        Ok(Some(HeldEntry {
            original,
            held,
            settled: false,
        }))
    }
}

/// A cache entry temporarily relocated to the holding root
///
/// Dropping an unsettled guard moves the file back to its original path.
#[derive(Debug)]
#[must_use = "a held cache entry must be committed or rolled back"]
pub struct HeldEntry {
    original: PathBuf,
    held: PathBuf,
    settled: bool,
}

impl HeldEntry {
    pub fn held_path(&self) -> &Path {
        &self.held
    }

    /// Discards the held copy; the proxy has written a fresh entry
    pub async fn commit(mut self) -> CacheResult<()> {
        // Never restore over a fresh entry, even if removal fails.
        self.settled = true;
        tokio::fs::remove_file(&self.held)
            .await
            .map_err(|source| CacheError::Io {
                path: self.held.clone(),
                source,
            })
    }

    /// Moves the held copy back to its original path
    pub async fn rollback(mut self) -> CacheResult<()> {
        self.settled = true;

        if let Some(parent) = self.original.parent() {
            if let Err(source) = tokio::fs::create_dir_all(parent).await {
                return Err(CacheError::RollbackFailed {
                    held: self.held.clone(),
                    original: self.original.clone(),
                    source,
                });
            }
        }

        tokio::fs::rename(&self.held, &self.original)
            .await
            .map_err(|source| CacheError::RollbackFailed {
                held: self.held.clone(),
                original: self.original.clone(),
                source,
            })
    }
}

impl Drop for HeldEntry {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let restored = match self.original.parent() {
            Some(parent) => std::fs::create_dir_all(parent),
            None => Ok(()),
        }
        .and_then(|()| std::fs::rename(&self.held, &self.original));

        match restored {
            Ok(()) => tracing::warn!(
                "Cache file restored to {} after an interrupted renew",
                self.original.display()
            ),
            Err(e) => tracing::error!(
                "Failed to restore cache file {} to {}: {}. Operator attention required",
                self.held.display(),
                self.original.display(),
                e
            ),
        }
    }
}
