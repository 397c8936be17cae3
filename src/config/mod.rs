//! Configuration module for Cache-Crawler
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so an absent file behaves
//! like an empty one.
//!
//! # Example
//!
//! ```no_run
//! use cache_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Cache root: {}", config.cache.cache_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, CrawlerConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
