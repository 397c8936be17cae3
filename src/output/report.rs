//! Final crawl report

use crate::state::PageState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Crawl summary produced when the frontier is exhausted
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Seed URL after normalization
    pub seed: String,

    /// Number of terminal outcomes by state
    pub pages_by_state: HashMap<PageState, u64>,

    /// Cache entries renewed before fetching
    pub renewed: u64,

    /// Cache entries purged after fetching
    pub purged: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn new(seed: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            seed: seed.into(),
            pages_by_state: HashMap::new(),
            renewed: 0,
            purged: 0,
            started_at,
            finished_at: started_at,
        }
    }

    /// Counts one terminal outcome
    pub fn record(&mut self, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;
    }

    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// URLs fetched successfully
    pub fn visited(&self) -> u64 {
        self.count(PageState::Extracted)
    }

    /// Fetch attempts that failed
    pub fn failed(&self) -> u64 {
        self.count(PageState::Failed)
    }

    /// Dequeued URLs skipped because they were already visited
    pub fn skipped(&self) -> u64 {
        self.count(PageState::Skipped)
    }

    pub fn elapsed_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// One-line summary printed at the end of every run, quiet or not
    pub fn summary(&self) -> String {
        format!("Crawling complete with {} visited URLs", self.visited())
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Seed: {}", report.seed);
    println!(
        "Started: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "Finished: {} ({}s)",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.elapsed_seconds()
    );
    println!();

    println!("Outcomes:");
    println!("  Visited: {}", report.visited());
    println!("  Failed: {}", report.failed());
    println!("  Skipped: {}", report.skipped());
    println!();

    if report.renewed > 0 || report.purged > 0 {
        println!("Cache:");
        println!("  Renewed: {}", report.renewed);
        println!("  Purged: {}", report.purged);
        println!();
    }

    println!("{}", report.summary());
}
