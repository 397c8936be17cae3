//! URL handling module for Cache-Crawler
//!
//! This module provides the scheme downgrade applied to every crawl URL,
//! relative-link resolution, authority extraction and the domain allow-list.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{authority, AllowedDomains};
pub use normalize::{downgrade_scheme, normalize_url, resolve_link};
