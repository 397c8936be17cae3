use crate::{UrlError, UrlResult};
use url::Url;

/// Rewrites an `https` URL to `http` in place
///
/// The crawl target sits behind an HTTP-only proxy tier, so every request and
/// every cache key is derived from the `http` form. Any other scheme is left
/// untouched.
pub fn downgrade_scheme(url: &mut Url) {
    if url.scheme() == "https" {
        // http and https are both special schemes, so the switch cannot fail
        let _ = url.set_scheme("http");
    }
}

/// Parses and normalizes a crawl URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host
/// 4. Downgrade `https` to `http`
///
/// Trailing slashes, query order and fragments are kept as written; two URLs
/// are the same crawl entity only when their normalized strings are equal.
///
/// # Examples
///
/// ```
/// use cache_crawler::url::normalize_url;
///
/// let url = normalize_url("https://example.com/page/").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page/");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    downgrade_scheme(&mut url);
    Ok(url)
}

/// Resolves a discovered reference against the page it was found on
///
/// Standard relative-reference resolution is applied. References that do not
/// resolve to an `http`/`https` URL with a host (`mailto:`, `javascript:`,
/// `data:` and friends) yield `None`. The result is already downgraded.
pub fn resolve_link(base_url: &Url, reference: &str) -> Option<Url> {
    let mut resolved = base_url.join(reference).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.host_str()?;

    downgrade_scheme(&mut resolved);
    Some(resolved)
}
