use std::collections::HashSet;
use url::Url;

/// Extracts the authority used for scope checks from a URL
///
/// This is the lowercase host, followed by `:port` when the URL carries an
/// explicit non-default port. Returns None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use cache_crawler::url::authority;
///
/// let url = Url::parse("http://EXAMPLE.com/path").unwrap();
/// assert_eq!(authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://example.com:8080/").unwrap();
/// assert_eq!(authority(&url), Some("example.com:8080".to_string()));
/// ```
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Hostnames a markup-extracted link may point at
///
/// Immutable for the duration of a crawl. An empty set admits nothing.
#[derive(Debug, Clone, Default)]
pub struct AllowedDomains {
    domains: HashSet<String>,
}

impl AllowedDomains {
    /// Builds the set from user-supplied names, lowercased and trimmed
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    /// Returns true if the URL's authority is a member of the set
    pub fn permits(&self, url: &Url) -> bool {
        authority(url).is_some_and(|a| self.domains.contains(&a))
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }
}
