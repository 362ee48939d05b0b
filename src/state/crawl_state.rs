//! The resumable crawl state shared by crawl and download batches

use crate::state::{Frontier, PageState};
use std::collections::HashSet;

/// Outcome of analyzing one page
///
/// All links are canonical. Link lists carry set semantics (no duplicates)
/// and keep the order in which the analyzer found them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Canonical URL of the analyzed page
    pub url: String,

    /// Other article pages linked from this page
    pub article_links: Vec<String>,

    /// Image-hosting pages linked from this page
    pub image_links: Vec<String>,
}

/// What a successful visit changed in the state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitOutcome {
    /// Article links newly appended to the frontier
    pub enqueued: usize,

    /// Image links never seen before this visit
    pub new_images: usize,
}

/// Mutable, resumable state of one harvesting session
///
/// Invariants:
/// - a URL is never both queued and visited
/// - `pending_downloads` is a subset of `discovered_images`
/// - `visited` and `discovered_images` only grow (except on an explicit reset)
#[derive(Debug, Clone)]
pub struct CrawlState {
    entrypoint: String,
    last_visited: String,
    visited: HashSet<String>,
    frontier: Frontier,
    discovered_images: HashSet<String>,
    pending_downloads: HashSet<String>,
    failed: HashSet<String>,
}

impl CrawlState {
    /// Creates an empty state seeded with the entrypoint as resume point
    pub fn new(entrypoint: impl Into<String>) -> Self {
        let entrypoint = entrypoint.into();
        Self {
            last_visited: entrypoint.clone(),
            entrypoint,
            visited: HashSet::new(),
            frontier: Frontier::new(),
            discovered_images: HashSet::new(),
            pending_downloads: HashSet::new(),
            failed: HashSet::new(),
        }
    }

    /// Rebuilds a state from persisted parts
    ///
    /// Entries that would break an invariant are dropped with a warning:
    /// frontier entries already visited, and pending downloads that were
    /// never discovered (those are added to the discovered set instead).
    pub fn restore(
        entrypoint: String,
        last_visited: String,
        visited: HashSet<String>,
        frontier: Vec<String>,
        mut discovered_images: HashSet<String>,
        pending_downloads: HashSet<String>,
    ) -> Self {
        let mut queue: Frontier = frontier.into_iter().collect();
        queue.retain(|url| {
            let keep = !visited.contains(url);
            if !keep {
                tracing::warn!("Dropping already visited URL from stored frontier: {}", url);
            }
            keep
        });

        for url in &pending_downloads {
            if discovered_images.insert(url.clone()) {
                tracing::warn!("Pending image {} was missing from discovered images", url);
            }
        }

        Self {
            entrypoint,
            last_visited,
            visited,
            frontier: queue,
            discovered_images,
            pending_downloads,
            failed: HashSet::new(),
        }
    }

    /// The original seed URL
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    /// The most recently analyzed URL (default resume point)
    pub fn last_visited(&self) -> &str {
        &self.last_visited
    }

    /// URLs analyzed so far
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// URLs waiting to be analyzed
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Every image link ever discovered
    pub fn discovered_images(&self) -> &HashSet<String> {
        &self.discovered_images
    }

    /// Image links awaiting the next download batch
    pub fn pending_downloads(&self) -> &HashSet<String> {
        &self.pending_downloads
    }

    /// URLs that failed during this run
    pub fn failed(&self) -> &HashSet<String> {
        &self.failed
    }

    /// Lifecycle state of a page reference
    pub fn page_state(&self, url: &str) -> PageState {
        if self.visited.contains(url) {
            PageState::Visited
        } else if self.frontier.contains(url) {
            PageState::Queued
        } else if self.failed.contains(url) {
            PageState::Failed
        } else {
            PageState::Unseen
        }
    }

    /// Puts a start URL at the head of the frontier
    ///
    /// Does nothing if the URL is already visited or already queued. An
    /// explicit start overrides an earlier failure in this run.
    ///
    /// Returns true if the URL was queued.
    pub fn seed(&mut self, url: &str) -> bool {
        if self.visited.contains(url) {
            return false;
        }
        self.failed.remove(url);
        self.frontier.push_front(url.to_string())
    }

    /// Dequeues the next page to analyze
    pub fn next_page(&mut self) -> Option<String> {
        self.frontier.pop_front()
    }

    /// Records a successfully analyzed page
    ///
    /// Marks the page visited, moves the resume point, merges its images
    /// into the discovered and pending sets, and appends unseen article
    /// links to the back of the frontier in the order given.
    pub fn record_visit(&mut self, result: &PageResult) -> VisitOutcome {
        let mut outcome = VisitOutcome::default();

        self.visited.insert(result.url.clone());
        self.last_visited = result.url.clone();

        for image in &result.image_links {
            if self.discovered_images.insert(image.clone()) {
                outcome.new_images += 1;
            }
            self.pending_downloads.insert(image.clone());
        }

        for link in &result.article_links {
            if self.visited.contains(link) || self.failed.contains(link) {
                continue;
            }
            if self.frontier.push_back(link.clone()) {
                outcome.enqueued += 1;
            }
        }

        outcome
    }

    /// Records a page whose fetch or analysis failed
    ///
    /// The page is neither visited nor re-queued for the rest of this run.
    pub fn record_failure(&mut self, url: &str) {
        self.failed.insert(url.to_string());
    }

    /// Snapshot of the pending downloads, sorted for stable processing order
    pub fn pending_snapshot(&self) -> Vec<String> {
        let mut pending: Vec<String> = self.pending_downloads.iter().cloned().collect();
        pending.sort();
        pending
    }

    /// Empties the pending download set after a download batch
    pub fn clear_pending(&mut self) {
        self.pending_downloads.clear();
    }

    /// Forgets all crawl progress, keeping only the entrypoint
    pub fn reset(&mut self) {
        self.visited.clear();
        self.frontier.clear();
        self.discovered_images.clear();
        self.pending_downloads.clear();
        self.failed.clear();
        self.last_visited = self.entrypoint.clone();
    }
}
