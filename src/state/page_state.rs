/// Per-URL crawl state definitions
///
/// A URL moves `Queued → (Renewing) → Fetching → {Extracted | Skipped | Failed}`.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// URL is in the frontier
    Queued,

    /// The proxy's cache entry is being held aside and refreshed
    Renewing,

    /// URL is being fetched
    Fetching,

    // ===== Terminal States =====
    /// Fetched successfully and scanned for links; the URL is visited
    Extracted,

    /// Dequeued after it had already been visited
    Skipped,

    /// Fetch failed; the URL stays unvisited and may be retried if rediscovered
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Extracted | Self::Skipped | Self::Failed)
    }

    /// Returns true if this state marks the URL visited
    pub fn is_visited(&self) -> bool {
        matches!(self, Self::Extracted)
    }

    /// Checks whether moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use PageState::*;
        matches!(
            (self, next),
            (Queued, Renewing)
                | (Queued, Fetching)
                | (Queued, Skipped)
                | (Renewing, Fetching)
                | (Fetching, Extracted)
                | (Fetching, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Renewing => "renewing",
            Self::Fetching => "fetching",
            Self::Extracted => "extracted",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
