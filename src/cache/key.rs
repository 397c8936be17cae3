use crate::url::downgrade_scheme;
use md5::{Digest, Md5};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Directory sharding scheme of the proxy cache tree
///
/// Levels are cut from the end of the hex MD5 digest: `1:2` places an entry
/// at `{d[-1]}/{d[-3..-1]}/{d}`, `1:2:3` adds `{d[-6..-3]}` as a third level,
/// and `none` stores every entry directly under the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum ShardLevels {
    #[default]
    #[serde(rename = "1:2")]
    OneTwo,
    #[serde(rename = "1:2:3")]
    OneTwoThree,
    #[serde(rename = "none")]
    Flat,
}

impl FromStr for ShardLevels {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:2" => Ok(Self::OneTwo),
            "1:2:3" => Ok(Self::OneTwoThree),
            "none" => Ok(Self::Flat),
            other => Err(format!(
                "unsupported cache levels '{}', expected 1:2, 1:2:3 or none",
                other
            )),
        }
    }
}

impl fmt::Display for ShardLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OneTwo => "1:2",
            Self::OneTwoThree => "1:2:3",
            Self::Flat => "none",
        };
        write!(f, "{}", s)
    }
}

/// Derives the proxy cache key for a GET of `url`
///
/// The key mirrors `$scheme$request_method$host$uri`: scheme after the
/// https→http downgrade, the literal `GET`, the host without port, and the
/// path without query string.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use cache_crawler::cache::cache_key;
///
/// let url = Url::parse("https://example.com/about").unwrap();
/// assert_eq!(cache_key(&url), "httpGETexample.com/about");
/// ```
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    downgrade_scheme(&mut url);

    format!(
        "{}GET{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}

/// Hex MD5 digest of a cache key
pub fn key_digest(key: &str) -> String {
    hex::encode(Md5::digest(key.as_bytes()))
}

/// Computes the shard path of a cache key, relative to the cache root
///
/// `key` must not be empty; [`cache_key`] never produces an empty key.
pub fn shard_path(key: &str, levels: ShardLevels) -> PathBuf {
    debug_assert!(!key.is_empty(), "cache keys are never empty");

    let digest = key_digest(key);
    let len = digest.len();
    let mut path = PathBuf::new();

    match levels {
        ShardLevels::OneTwo => {
            path.push(&digest[len - 1..]);
            path.push(&digest[len - 3..len - 1]);
        }
        ShardLevels::OneTwoThree => {
            path.push(&digest[len - 1..]);
            path.push(&digest[len - 3..len - 1]);
            path.push(&digest[len - 6..len - 3]);
        }
        ShardLevels::Flat => {}
    }

    path.push(&digest);
    path
}
