//! Crawl engine - main crawl orchestration logic
//!
//! The engine owns the frontier and the visited set and is the only place
//! either is mutated. Per-URL work (renew, fetch, purge, link extraction)
//! runs as tasks in a `JoinSet`, at most `max_in_flight` at a time; their
//! outcomes are merged back by the single driver loop in [`CrawlEngine::run`].

use crate::cache::{CacheCoordinator, CacheStore};
use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, FetchedPage, Fetcher};
use crate::crawler::frontier::{Frontier, VisitedSet};
use crate::crawler::parser::{extract_from_markup, extract_from_text, is_textual, ExtractMode};
use crate::output::CrawlReport;
use crate::state::PageState;
use crate::url::{authority, downgrade_scheme, AllowedDomains};
use crate::CrawlError;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Per-run crawl switches
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Hosts markup-extracted links may point at
    pub allowed_domains: AllowedDomains,

    /// Renew each URL's proxy cache entry before fetching it
    pub purge_before_fetch: bool,

    /// Purge each URL from the proxy cache after a successful fetch
    pub clean_cache_after_fetch: bool,
}

/// Shared, read-only state handed to every visit task
#[derive(Debug)]
struct VisitContext {
    fetcher: Fetcher,
    coordinator: CacheCoordinator,
    options: CrawlOptions,
}

/// What a visit task reports back to the driver
#[derive(Debug)]
struct VisitOutcome {
    url: Url,
    state: PageState,
    renewed: bool,
    purged: bool,
    links: HashSet<Url>,
}

/// Main crawl engine structure
pub struct CrawlEngine {
    context: Arc<VisitContext>,
    max_in_flight: usize,
    frontier: Frontier,
    visited: VisitedSet,
    in_flight: HashSet<Url>,
    /// Dequeued while already in flight; returned to the frontier as tasks finish
    deferred: Vec<Url>,
}

impl CrawlEngine {
    /// Creates an engine from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: &Config, options: CrawlOptions) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::from_config(&config.crawler)?;
        let store = CacheStore::from_config(&config.cache);
        Ok(Self::with_parts(
            fetcher,
            store,
            options,
            config.crawler.max_concurrent_requests,
        ))
    }

    /// Creates an engine from prebuilt parts
    pub fn with_parts(
        fetcher: Fetcher,
        store: CacheStore,
        options: CrawlOptions,
        max_in_flight: usize,
    ) -> Self {
        let coordinator = CacheCoordinator::new(fetcher.clone(), store);
        Self {
            context: Arc::new(VisitContext {
                fetcher,
                coordinator,
                options,
            }),
            max_in_flight: max_in_flight.max(1),
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            in_flight: HashSet::new(),
            deferred: Vec::new(),
        }
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Crawls from `seed` until the frontier is exhausted
    ///
    /// Individual failures are logged and absorbed; the run always completes
    /// with a report.
    pub async fn run(&mut self, mut seed: Url) -> CrawlReport {
        downgrade_scheme(&mut seed);
        tracing::info!("Start crawling at {}", seed);

        let mut report = CrawlReport::new(seed.as_str(), Utc::now());
        self.frontier.insert(seed.clone());

        let mut tasks = JoinSet::new();
        loop {
            self.dispatch(&seed, &mut tasks, &mut report);

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            match joined {
                Ok(outcome) => self.complete(outcome, &mut report),
                Err(e) => tracing::error!("Crawl task aborted: {}", e),
            }
        }

        report.finished_at = Utc::now();
        tracing::info!("Crawling complete with {} visited URLs", self.visited.len());
        report
    }

    /// Starts visit tasks until the frontier is empty or the in-flight cap is reached
    fn dispatch(&mut self, seed: &Url, tasks: &mut JoinSet<VisitOutcome>, report: &mut CrawlReport) {
        while tasks.len() < self.max_in_flight {
            if self.frontier.is_empty() {
                break;
            }
            tracing::info!(
                "{} - Queue: {}, Visited: {}",
                seed,
                self.frontier.len(),
                self.visited.len()
            );

            let Some(url) = self.frontier.pop() else {
                break;
            };

            if self.visited.contains(&url) {
                tracing::info!("Already visited {}", url);
                advance(&url, PageState::Queued, PageState::Skipped);
                report.record(PageState::Skipped);
                continue;
            }

            if self.in_flight.contains(&url) {
                tracing::trace!("{} is already in flight, deferring", url);
                self.deferred.push(url);
                continue;
            }

            self.in_flight.insert(url.clone());
            tasks.spawn(visit(Arc::clone(&self.context), url));
        }
    }

    /// Merges a finished visit into the frontier and visited set
    fn complete(&mut self, outcome: VisitOutcome, report: &mut CrawlReport) {
        debug_assert!(
            outcome.state.is_terminal(),
            "visit ended in {}",
            outcome.state
        );
        self.in_flight.remove(&outcome.url);
        self.frontier.extend(self.deferred.drain(..));

        if outcome.renewed {
            report.renewed += 1;
        }
        if outcome.purged {
            report.purged += 1;
        }
        report.record(outcome.state);

        if !outcome.state.is_visited() {
            return;
        }

        self.visited.insert(outcome.url);
        let discovered = outcome.links.len();
        self.frontier.extend(outcome.links);
        tracing::trace!(
            "Merged {} links, frontier now {}",
            discovered,
            self.frontier.len()
        );
    }
}

/// Runs one URL through renew → fetch → purge → extract
async fn visit(context: Arc<VisitContext>, url: Url) -> VisitOutcome {
    let options = &context.options;
    let mut state = PageState::Queued;

    let mut renewed = false;
    if options.purge_before_fetch {
        state = advance(&url, state, PageState::Renewing);
        // Renew only forces a cache miss; the fetch below runs either way.
        renewed = context.coordinator.renew(&url).await;
    }

    state = advance(&url, state, PageState::Fetching);
    let page = match context.fetcher.fetch(&url).await {
        FetchResult::Success(page) => page,
        FetchResult::Failure(failure) => {
            tracing::warn!("Giving up on {} for now: {}", url, failure);
            let state = advance(&url, state, PageState::Failed);
            return VisitOutcome {
                url,
                state,
                renewed,
                purged: false,
                links: HashSet::new(),
            };
        }
    };

    tracing::info!(
        "Successfully fetched {}: {}, {}",
        url,
        page.status,
        page.content_type.as_deref().unwrap_or("no content type")
    );

    let mut purged = false;
    if options.clean_cache_after_fetch {
        match context.coordinator.purge(&url).await {
            Ok(purge) => {
                tracing::debug!("Purge response for {}: {:?}", url, purge);
                purged = true;
            }
            Err(e) => tracing::error!("Failed to purge {}: {}", url, e),
        }
    }

    let links = extract_links(&page, &options.allowed_domains);
    let state = advance(&url, state, PageState::Extracted);
    VisitOutcome {
        url,
        state,
        renewed,
        purged,
        links,
    }
}

/// Extracts outbound links from a fetched page
///
/// Only textual content types are decoded. The extractor is then chosen by
/// URL suffix, not by content type.
fn extract_links(page: &FetchedPage, allowed: &AllowedDomains) -> HashSet<Url> {
    let Some(content_type) = page.content_type.as_deref() else {
        return HashSet::new();
    };
    if !is_textual(content_type) {
        return HashSet::new();
    }

    let text = page.text();
    match ExtractMode::for_url(&page.url) {
        ExtractMode::Markup => extract_from_markup(&text, &page.url, allowed),
        ExtractMode::Text => match authority(&page.url) {
            Some(host) => extract_from_text(&text, &page.url, &host),
            None => HashSet::new(),
        },
    }
}

fn advance(url: &Url, from: PageState, to: PageState) -> PageState {
    debug_assert!(
        from.can_transition_to(to),
        "invalid transition {} -> {}",
        from,
        to
    );
    tracing::trace!("{}: {} -> {}", url, from, to);
    to
}
