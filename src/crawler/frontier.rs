//! Frontier and visited-set bookkeeping for the crawl engine
//!
//! Both collections have set semantics keyed by the normalized URL string.
//! The frontier yields entries in discovery order.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// URLs discovered but not yet fetch-attempted
#[derive(Debug, Default)]
pub struct Frontier {
    order: VecDeque<Url>,
    pending: HashSet<Url>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL, returning false if it was already pending
    pub fn insert(&mut self, url: Url) -> bool {
        if !self.pending.insert(url.clone()) {
            return false;
        }
        self.order.push_back(url);
        true
    }

    /// Removes and returns the oldest pending URL
    pub fn pop(&mut self) -> Option<Url> {
        let next = self.order.pop_front()?;
        self.pending.remove(&next);
        Some(next)
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.pending.contains(url)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<Url> for Frontier {
    fn extend<T: IntoIterator<Item = Url>>(&mut self, iter: T) {
        for url in iter {
            self.insert(url);
        }
    }
}

/// URLs that completed a successful fetch
///
/// Entries are never removed.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<Url>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL visited, returning false if it already was
    pub fn insert(&mut self, url: Url) -> bool {
        self.urls.insert(url)
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Visited URLs as strings, sorted for stable output
    pub fn sorted(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.iter().map(Url::to_string).collect();
        urls.sort();
        urls
    }
}
