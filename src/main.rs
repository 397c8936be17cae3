//! Cache-Crawler main entry point
//!
//! This is the command-line interface for the Cache-Crawler web crawler.

use anyhow::Context;
use cache_crawler::config::{load_config, Config};
use cache_crawler::crawler::{crawl, CrawlOptions};
use cache_crawler::output::print_report;
use cache_crawler::AllowedDomains;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cache-Crawler: crawl a website through its caching proxy
///
/// Walks every in-scope link reachable from the seed URL, optionally
/// renewing each page's proxy cache entry before fetching it and purging
/// it afterwards.
#[derive(Parser, Debug)]
#[command(name = "crawl")]
#[command(version)]
#[command(about = "Crawl a website", long_about = None)]
struct Cli {
    /// The URL of the website to crawl
    #[arg(value_name = "URL")]
    url: String,

    /// List of allowed domains
    #[arg(long, num_args = 1.., value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Renew each URL's cache entry before visiting it
    #[arg(long)]
    purge: bool,

    /// Purge each URL from the cache after visiting it
    #[arg(long)]
    clean_cache: bool,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the number of concurrent requests
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_requests = concurrency;
    }

    let options = CrawlOptions {
        allowed_domains: AllowedDomains::new(&cli.domains),
        purge_before_fetch: cli.purge,
        clean_cache_after_fetch: cli.clean_cache,
    };

    let mut allowed: Vec<&str> = options.allowed_domains.iter().collect();
    allowed.sort_unstable();
    tracing::info!("Allowed domains: {:?}", allowed);
    if options.purge_before_fetch || options.clean_cache_after_fetch {
        tracing::info!(
            "Cache dir: {} (levels {}), temp dir: {}",
            config.cache.cache_dir.display(),
            config.cache.levels,
            config.cache.temp_dir.display()
        );
    }

    let report = crawl(&config, options, &cli.url)
        .await
        .with_context(|| format!("failed to start crawling {}", cli.url))?;

    if cli.quiet {
        println!("{}", report.summary());
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cache_crawler=info,warn"),
            1 => EnvFilter::new("cache_crawler=debug,info"),
            2 => EnvFilter::new("cache_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
