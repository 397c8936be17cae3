//! Link extraction from fetched content
//!
//! Two extractors are provided:
//! - Markup mode parses HTML and collects `href`/`src` attributes, keeping
//!   links whose host is on the allow-list
//! - Text mode scans freeform text (scripts, stylesheets) for URL-looking
//!   tokens, keeping links on the same host as the source page

use crate::url::{authority, resolve_link, AllowedDomains};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Elements and the attribute carrying their outbound reference
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("script", "src"),
    ("img", "src"),
    ("video", "src"),
    ("audio", "src"),
];

/// MIME types decoded as text besides the whole `text/*` family
const TEXTUAL_TYPES: &[&str] = &["application/javascript"];

lazy_static! {
    /// Absolute http(s) URLs or bare `www.` hosts, up to whitespace, `<`, `>` or `"`
    static ref TEXT_LINK_PATTERN: Regex =
        Regex::new(r#"https?://[^\s<>"]+|www\.[^\s<>"]+"#).expect("Invalid text link regex");
}

/// Errors raised while extracting links from markup
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Markup parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

/// Which extractor handles a fetched body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Markup,
    Text,
}

impl ExtractMode {
    /// Picks the extractor from the URL suffix
    ///
    /// URLs ending in `.js` or `.css` are scanned as text, everything else
    /// is parsed as markup. The declared content type only decides whether
    /// the body is textual at all, see [`is_textual`].
    pub fn for_url(url: &Url) -> Self {
        let url = url.as_str();
        if url.ends_with(".js") || url.ends_with(".css") {
            Self::Text
        } else {
            Self::Markup
        }
    }
}

/// Returns true when a Content-Type value denotes content worth scanning for links
///
/// Compares the MIME essence, so parameters such as `charset` are ignored.
pub fn is_textual(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("text/") || TEXTUAL_TYPES.contains(&essence.as_str())
}

/// Parses markup and returns every referenced URL whose host is allowed
///
/// # Arguments
///
/// * `html` - The markup to parse
/// * `base_url` - The URL of the page, used to resolve relative references
/// * `allowed` - Hosts a link may point at
///
/// # Returns
///
/// * `Ok(HashSet<Url>)` - Allowed links, resolved and downgraded to http
/// * `Err(ExtractError)` - The markup could not be queried
pub fn parse_markup(
    html: &str,
    base_url: &Url,
    allowed: &AllowedDomains,
) -> Result<HashSet<Url>, ExtractError> {
    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        tracing::debug!(
            "Recovered from {} markup errors on {}",
            document.errors.len(),
            base_url
        );
    }

    let mut links = HashSet::new();

    for (tag, attr) in LINK_SOURCES {
        let selector =
            Selector::parse(&format!("{}[{}]", tag, attr)).map_err(|e| ExtractError::Parse {
                url: base_url.to_string(),
                message: format!("{:?}", e),
            })?;

        for element in document.select(&selector) {
            let Some(reference) = element.value().attr(attr) else {
                continue;
            };

            if let Some(url) = resolve_link(base_url, reference) {
                if allowed.permits(&url) {
                    links.insert(url);
                }
            }
        }
    }

    Ok(links)
}

/// Markup extraction that never fails
///
/// Parse errors are logged and yield an empty set.
pub fn extract_from_markup(html: &str, base_url: &Url, allowed: &AllowedDomains) -> HashSet<Url> {
    let links = match parse_markup(html, base_url, allowed) {
        Ok(links) => links,
        Err(e) => {
            tracing::error!("Failed to parse {}: {}", base_url, e);
            return HashSet::new();
        }
    };

    tracing::info!("Found {} links on {}", links.len(), base_url);
    links
}

/// Scans freeform text for links on `current_host`
///
/// Matches are resolved against `base_url` and kept only when their
/// authority equals `current_host` exactly. The allow-list plays no part.
pub fn extract_from_text(text: &str, base_url: &Url, current_host: &str) -> HashSet<Url> {
    let links: HashSet<Url> = TEXT_LINK_PATTERN
        .find_iter(text)
        .filter_map(|m| resolve_link(base_url, m.as_str()))
        .filter(|url| authority(url).as_deref() == Some(current_host))
        .collect();

    tracing::info!("Found {} links on {}", links.len(), base_url);
    links
}
