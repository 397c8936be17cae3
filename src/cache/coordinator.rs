//! Purge and renew operations against the reverse-proxy cache

use crate::cache::store::CacheStore;
use crate::cache::{CacheError, CacheResult};
use crate::crawler::{FetchResult, Fetcher};
use reqwest::StatusCode;
use url::Url;

/// Successful outcome of a purge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// The proxy dropped its entry
    Purged,
    /// The proxy answered 404: nothing was cached
    AlreadyPurged,
}

/// Successful outcome of a renew attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewOutcome {
    /// The old entry was held aside, the refetch succeeded and the held copy was discarded
    Renewed,
    /// No cache entry exists for the URL; nothing was touched
    NotCached,
    /// The refetch failed and the original entry was moved back
    RolledBack,
}

/// Coordinates crawl fetches with the proxy cache
#[derive(Debug, Clone)]
pub struct CacheCoordinator {
    fetcher: Fetcher,
    store: CacheStore,
}

impl CacheCoordinator {
    pub fn new(fetcher: Fetcher, store: CacheStore) -> Self {
        Self { fetcher, store }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Invalidates the proxy's entry for `url` with a `PURGE` request
    ///
    /// A 404 answer means the entry was already gone and counts as success.
    pub async fn purge(&self, url: &Url) -> CacheResult<PurgeOutcome> {
        tracing::info!("Purging {}", url);

        let status = self
            .fetcher
            .purge(url)
            .await
            .map_err(|source| CacheError::Transport {
                url: url.to_string(),
                source,
            })?;

        if status == StatusCode::NOT_FOUND {
            tracing::info!("URL {} is already purged", url);
            return Ok(PurgeOutcome::AlreadyPurged);
        }

        if status.is_success() || status.is_redirection() {
            return Ok(PurgeOutcome::Purged);
        }

        Err(CacheError::Protocol {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }

    /// Forces the proxy to regenerate its entry for `url`
    ///
    /// # Protocol
    ///
    /// 1. No entry at the shard path → [`RenewOutcome::NotCached`], no side effects
    /// 2. Move the entry into the holding root so the proxy sees a miss
    /// 3. Fetch `url`
    ///    - failure → move the held entry back ([`RenewOutcome::RolledBack`])
    ///    - success → delete the held entry ([`RenewOutcome::Renewed`])
    ///
    /// The held entry is guarded, so it is moved back on every exit path that
    /// does not reach an explicit commit or rollback.
    pub async fn try_renew(&self, url: &Url) -> CacheResult<RenewOutcome> {
        tracing::info!("Checking availability of {}", url);

        let held = match self.store.hold(url).await? {
            Some(held) => held,
            None => return Ok(RenewOutcome::NotCached),
        };

        match self.fetcher.fetch(url).await {
            FetchResult::Success(_) => {
                held.commit().await?;
                tracing::info!("Successfully renewed cache for {}", url);
                Ok(RenewOutcome::Renewed)
            }
            FetchResult::Failure(failure) => {
                tracing::error!("Failed to fetch {} during renew: {}", url, failure);
                held.rollback().await?;
                tracing::warn!("Cache file restored for {}", url);
                Ok(RenewOutcome::RolledBack)
            }
        }
    }

    /// Renews the cache entry for `url`, reporting only whether it was renewed
    ///
    /// Every error is logged and absorbed. A failed rollback is the one case
    /// that leaves the original entry outside the cache tree.
    pub async fn renew(&self, url: &Url) -> bool {
        match self.try_renew(url).await {
            Ok(outcome) => outcome == RenewOutcome::Renewed,
            Err(e @ CacheError::RollbackFailed { .. }) => {
                tracing::error!(
                    "Failed to renew cache for {}: {}. Operator attention required",
                    url,
                    e
                );
                false
            }
            Err(e) => {
                tracing::error!("Failed to renew cache for {}: {}", url, e);
                false
            }
        }
    }
}
