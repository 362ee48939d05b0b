//! Crawl batch coordination
//!
//! This module contains the breadth-first crawl loop:
//! - Seeding the frontier with the batch's start URL
//! - Dequeuing and analyzing pages strictly one at a time
//! - Recording visits and absorbing per-page failures
//! - Stopping on the page or image limit

use crate::crawler::PageAnalyzer;
use crate::state::{CrawlState, PageState};

/// Per-page outcome of a batch, kept for the storage layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub url: String,
    pub state: PageState,
    pub error: Option<String>,
}

/// Counters for one crawl batch
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// Pages successfully analyzed
    pub pages_visited: u32,

    /// Pages abandoned after a fetch or analysis failure
    pub pages_failed: u32,

    /// Image links found on visited pages, including ones seen before
    pub images_found: u32,

    /// Image links never discovered before this batch
    pub new_images: u32,

    /// Every page touched, in processing order
    pub pages: Vec<PageOutcome>,
}

impl BatchStats {
    fn limit_reached(&self, max_pages: u32, max_images: u32) -> bool {
        (max_images > 0 && self.images_found >= max_images)
            || (max_pages > 0 && self.pages_visited >= max_pages)
    }
}

/// Runs one bounded breadth-first crawl batch
///
/// # Traversal
///
/// 1. The start URL (default: the last visited page) is canonicalized and
///    put at the head of the frontier unless already visited or queued.
/// 2. Pages are dequeued in FIFO order and analyzed one at a time.
/// 3. A fetch or analysis failure abandons that page for the rest of the
///    run; the batch moves on.
/// 4. After every page the limits are checked. Zero means unbounded.
///
/// Unprocessed frontier entries stay queued for the next batch.
///
/// # Arguments
///
/// * `state` - The crawl state to advance
/// * `analyzer` - Fetches and analyzes pages
/// * `start` - Explicit start URL, if any
/// * `max_pages` - Pages to visit in this batch (0 = no limit)
/// * `max_images` - Image links to find in this batch (0 = no limit)
pub async fn crawl_batch(
    state: &mut CrawlState,
    analyzer: &PageAnalyzer,
    start: Option<&str>,
    max_pages: u32,
    max_images: u32,
) -> BatchStats {
    let start = analyzer.canonical(start.unwrap_or(state.last_visited()));
    if state.seed(&start) {
        tracing::debug!("Queued start URL {}", start);
    }

    let mut stats = BatchStats::default();

    while let Some(url) = state.next_page() {
        if state.visited().contains(&url) {
            tracing::debug!("Skipping already visited {}", url);
            continue;
        }

        tracing::info!("Analyzing {}", url);
        match analyzer.analyze(&url).await {
            Ok(result) => {
                let visit = state.record_visit(&result);
                stats.pages_visited += 1;
                stats.images_found += result.image_links.len() as u32;
                stats.new_images += visit.new_images as u32;
                tracing::debug!(
                    "{} new articles queued, {} new images from {}",
                    visit.enqueued,
                    visit.new_images,
                    url
                );
                stats.pages.push(PageOutcome {
                    url,
                    state: PageState::Visited,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!("Something went wrong with {}: {}", url, e);
                state.record_failure(&url);
                stats.pages_failed += 1;
                stats.pages.push(PageOutcome {
                    url,
                    state: PageState::Failed,
                    error: Some(e.to_string()),
                });
            }
        }

        if stats.limit_reached(max_pages, max_images) {
            break;
        }
    }

    tracing::info!(
        "Crawl batch done: {} pages visited, {} failed, {} images found ({} new), {} queued",
        stats.pages_visited,
        stats.pages_failed,
        stats.images_found,
        stats.new_images,
        state.frontier().len()
    );

    stats
}
