//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Bounded-concurrency HTTP fetching
//! - Markup and freeform-text link extraction
//! - Frontier and visited-set bookkeeping
//! - The crawl engine driving everything to frontier exhaustion

mod engine;
mod fetcher;
mod frontier;
mod parser;

pub use engine::{CrawlEngine, CrawlOptions};
pub use fetcher::{build_http_client, FetchFailure, FetchResult, FetchedPage, Fetcher};
pub use frontier::{Frontier, VisitedSet};
pub use parser::{
    extract_from_markup, extract_from_text, is_textual, parse_markup, ExtractError, ExtractMode,
};

use crate::config::{validate, Config};
use crate::output::CrawlReport;
use crate::url::normalize_url;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and the seed URL
/// 2. Build the HTTP client and permit pool
/// 3. Renew, fetch, purge and extract every reachable in-scope URL
/// 4. Return the final report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `options` - Allow-list and cache switches for this run
/// * `seed` - The URL to start from, as given on the command line
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran to frontier exhaustion
/// * `Err(CrawlError)` - Invalid configuration or seed, or the HTTP client
///   could not be built
pub async fn crawl(config: &Config, options: CrawlOptions, seed: &str) -> Result<CrawlReport> {
    validate(config)?;
    let seed = normalize_url(seed)?;

    let mut engine = CrawlEngine::new(config, options)?;
    Ok(engine.run(seed).await)
}
