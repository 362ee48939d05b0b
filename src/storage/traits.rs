//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{CrawlState, PageState};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// One backend holds one resumable crawl state plus the run history.
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Crawl State =====

    /// Replaces the stored crawl state with `state`
    ///
    /// Runs in a single transaction; visit and discovery timestamps of
    /// entries that were already stored are kept.
    fn save_state(&mut self, state: &CrawlState) -> StorageResult<()>;

    /// Loads the stored crawl state, if any
    ///
    /// Invariant violations in the stored data are repaired on load.
    fn load_state(&self) -> StorageResult<Option<CrawlState>>;

    /// Forgets the stored crawl state; run history is kept
    fn clear_state(&mut self) -> StorageResult<()>;

    // ===== History =====

    /// Records the lifecycle state a page reached in a run
    fn record_page(
        &mut self,
        run_id: i64,
        url: &str,
        state: PageState,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Records the outcome of one image download
    fn record_download(
        &mut self,
        run_id: i64,
        image_url: &str,
        saved_path: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    /// Number of pages in the stored visited set
    fn count_visited(&self) -> StorageResult<u64>;

    /// Number of pages in the stored frontier
    fn count_frontier(&self) -> StorageResult<u64>;

    /// Number of discovered images; only pending ones if `pending_only`
    fn count_images(&self, pending_only: bool) -> StorageResult<u64>;

    /// Number of recorded downloads that succeeded (or failed)
    fn count_downloads(&self, saved: bool) -> StorageResult<u64>;

    /// Number of pages that reached `state` in the given run
    fn count_pages_in_run(&self, run_id: i64, state: PageState) -> StorageResult<u64>;

    /// Number of runs recorded
    fn count_runs(&self) -> StorageResult<u64>;
}
