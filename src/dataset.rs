//! The dataset aggregate and the multi-batch session driver
//!
//! A `Dataset` owns one crawl state and alternates crawl batches with
//! download batches. When a storage backend is attached, the state is saved
//! after every batch so a later process can resume where this one stopped.

use crate::config::Config;
use crate::crawler::{crawl_batch, PageAnalyzer};
use crate::download::{download_batch, DownloadOptions};
use crate::state::CrawlState;
use crate::storage::Storage;
use crate::Result;
use std::path::PathBuf;

/// Bounds and settings for a whole harvesting session
#[derive(Debug, Clone)]
pub struct SessionPlan {
    /// Explicit start URL for the first batch (default: last visited page)
    pub start: Option<String>,

    /// Pages to visit in the whole session (0 = no limit)
    pub max_pages: u32,

    /// Image links to find in the whole session (0 = no limit)
    pub max_images: u32,

    /// Pages per crawl batch before a download batch runs (0 = no limit)
    pub batch_size: u32,

    /// Settings for every download batch
    pub download: DownloadOptions,
}

impl SessionPlan {
    /// Builds a plan from the `[crawler]` and `[download]` sections
    pub fn from_config(config: &Config, destination: PathBuf) -> Self {
        Self {
            start: None,
            max_pages: config.crawler.max_pages,
            max_images: config.crawler.max_images,
            batch_size: config.crawler.batch_size,
            download: DownloadOptions::from_config(&config.download, destination),
        }
    }
}

/// Totals accumulated over a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub pages_visited: u32,
    pub pages_failed: u32,
    /// Image links found on visited pages, repeats included
    pub images_found: u32,
    /// Image links never discovered before
    pub images_discovered: u32,
    pub images_saved: u32,
    pub images_failed: u32,
    pub batches: u32,
}

/// Mutable, resumable harvesting state plus the means to advance it
pub struct Dataset {
    state: CrawlState,
    analyzer: PageAnalyzer,
    storage: Option<(Box<dyn Storage>, i64)>,
    from_scratch: bool,
    summary: SessionSummary,
}

impl Dataset {
    /// Creates a dataset with an empty state seeded with `entrypoint`
    pub fn new(entrypoint: impl Into<String>, analyzer: PageAnalyzer) -> Self {
        Self::with_state(CrawlState::new(entrypoint), analyzer)
    }

    /// Creates a dataset around an existing (e.g. restored) state
    pub fn with_state(state: CrawlState, analyzer: PageAnalyzer) -> Self {
        Self {
            state,
            analyzer,
            storage: None,
            from_scratch: false,
            summary: SessionSummary::default(),
        }
    }

    /// Persists the state and run history to `storage` under `run_id`
    pub fn with_storage(mut self, storage: Box<dyn Storage>, run_id: i64) -> Self {
        self.storage = Some((storage, run_id));
        self
    }

    /// Resets visited pages and discovered images at the start of every crawl call
    pub fn from_scratch(mut self, enabled: bool) -> Self {
        self.from_scratch = enabled;
        self
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Totals since this dataset was created
    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Gives the storage backend back, e.g. to complete the run
    pub fn into_storage(self) -> Option<(Box<dyn Storage>, i64)> {
        self.storage
    }

    /// Runs one crawl batch
    ///
    /// # Arguments
    ///
    /// * `start` - Start URL; defaults to the last visited page
    /// * `max_pages` - Pages to visit in this batch (0 = no limit)
    /// * `max_images` - Image links to find in this batch (0 = no limit)
    ///
    /// # Returns
    ///
    /// * `Ok(&mut Self)` - For chaining into `download`
    /// * `Err(HarvestError::Storage)` - The state could not be saved
    pub async fn crawl(
        &mut self,
        start: Option<&str>,
        max_pages: u32,
        max_images: u32,
    ) -> Result<&mut Self> {
        if self.from_scratch {
            tracing::info!("Starting from scratch: forgetting visited pages and images");
            self.state.reset();
        }
        self.crawl_cumulative(start, max_pages, max_images).await
    }

    async fn crawl_cumulative(
        &mut self,
        start: Option<&str>,
        max_pages: u32,
        max_images: u32,
    ) -> Result<&mut Self> {
        let stats = crawl_batch(&mut self.state, &self.analyzer, start, max_pages, max_images).await;

        self.summary.pages_visited += stats.pages_visited;
        self.summary.pages_failed += stats.pages_failed;
        self.summary.images_found += stats.images_found;
        self.summary.images_discovered += stats.new_images;

        if let Some((storage, run_id)) = self.storage.as_mut() {
            for page in &stats.pages {
                storage.record_page(*run_id, &page.url, page.state, page.error.as_deref())?;
            }
            storage.save_state(&self.state)?;
        }

        Ok(self)
    }

    /// Downloads every pending image, then clears the pending set
    ///
    /// Per-image failures are logged and recorded; they never fail the batch.
    ///
    /// # Returns
    ///
    /// * `Ok(&mut Self)` - For chaining into the next `crawl`
    /// * `Err(HarvestError::Storage)` - Outcomes or state could not be saved
    pub async fn download(&mut self, options: &DownloadOptions) -> Result<&mut Self> {
        let pending = self.state.pending_snapshot();
        let report = download_batch(pending, &self.analyzer, options).await;
        self.state.clear_pending();

        self.summary.images_saved += report.saved() as u32;
        self.summary.images_failed += report.failed() as u32;

        if let Some((storage, run_id)) = self.storage.as_mut() {
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(path) => storage.record_download(
                        *run_id,
                        &outcome.image_page,
                        Some(&*path.to_string_lossy()),
                        None,
                    )?,
                    Err(message) => storage.record_download(
                        *run_id,
                        &outcome.image_page,
                        None,
                        Some(message.as_str()),
                    )?,
                }
            }
            storage.save_state(&self.state)?;
        }

        Ok(self)
    }

    /// Alternates crawl and download batches until a limit or the frontier ends the session
    ///
    /// Each crawl batch is bounded by `batch_size` and by what is left of
    /// the session's page and image budgets. A download batch follows every
    /// crawl batch. In from-scratch mode the state is reset once, before the
    /// first batch.
    ///
    /// # Returns
    ///
    /// * `Ok(SessionSummary)` - Totals for this session only
    /// * `Err(HarvestError)` - Only storage failures end a session early
    pub async fn run_session(&mut self, plan: &SessionPlan) -> Result<SessionSummary> {
        if self.from_scratch {
            tracing::info!("Starting from scratch: forgetting visited pages and images");
            self.state.reset();
        }

        let before = self.summary;
        let mut start = plan.start.clone();

        loop {
            let spent = session_delta(&before, &self.summary);
            let pages = batch_limit(plan.batch_size, remaining(plan.max_pages, spent.pages_visited));
            let images = remaining(plan.max_images, spent.images_found);

            self.crawl_cumulative(start.take().as_deref(), pages, images)
                .await?;
            self.download(&plan.download).await?;
            self.summary.batches += 1;

            let spent = session_delta(&before, &self.summary);
            if plan.max_pages > 0 && spent.pages_visited >= plan.max_pages {
                tracing::info!("Page limit of {} reached", plan.max_pages);
                break;
            }
            if plan.max_images > 0 && spent.images_found >= plan.max_images {
                tracing::info!("Image limit of {} reached", plan.max_images);
                break;
            }
            if self.state.frontier().is_empty() {
                tracing::info!("Frontier is empty, session complete");
                break;
            }
        }

        let summary = session_delta(&before, &self.summary);
        tracing::info!(
            "Session done in {} batches: {} pages visited ({} failed), {} images discovered, {} saved, {} failed",
            summary.batches,
            summary.pages_visited,
            summary.pages_failed,
            summary.images_discovered,
            summary.images_saved,
            summary.images_failed
        );
        Ok(summary)
    }
}

/// What is left of a budget where 0 means unbounded
///
/// Returns 0 (unbounded) only for an unbounded budget; an exhausted budget
/// is never passed on since the session stops first.
fn remaining(budget: u32, spent: u32) -> u32 {
    if budget == 0 {
        0
    } else {
        budget.saturating_sub(spent).max(1)
    }
}

/// Tightest of two limits where 0 means unbounded
fn batch_limit(batch_size: u32, remaining_pages: u32) -> u32 {
    match (batch_size, remaining_pages) {
        (0, r) => r,
        (b, 0) => b,
        (b, r) => b.min(r),
    }
}

fn session_delta(before: &SessionSummary, now: &SessionSummary) -> SessionSummary {
    SessionSummary {
        pages_visited: now.pages_visited - before.pages_visited,
        pages_failed: now.pages_failed - before.pages_failed,
        images_found: now.images_found - before.images_found,
        images_discovered: now.images_discovered - before.images_discovered,
        images_saved: now.images_saved - before.images_saved,
        images_failed: now.images_failed - before.images_failed,
        batches: now.batches - before.batches,
    }
}
