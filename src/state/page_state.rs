/// Page state definitions for tracking crawl progress
///
/// A page reference moves `Unseen -> Queued -> Visited` on success or
/// `Unseen -> Queued -> Failed` when fetching or analysis fails. Both end
/// states are terminal for the current run.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Never seen in this session
    Unseen,

    /// Waiting in the frontier
    Queued,

    /// Successfully analyzed; never fetched again
    Visited,

    /// Fetch or analysis failed; dropped for the rest of the run
    Failed,
}

impl PageState {
    /// Converts the page state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Queued => "queued",
            Self::Visited => "visited",
            Self::Failed => "failed",
        }
    }

    /// Parses a page state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "unseen" => Some(Self::Unseen),
            "queued" => Some(Self::Queued),
            "visited" => Some(Self::Visited),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
