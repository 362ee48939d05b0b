//! Statistics loaded from the harvest database
//!
//! This module extracts a summary of the stored crawl state and the run
//! history, and prints it for the `--stats` command.

use crate::state::PageState;
use crate::storage::{RunRecord, Storage};
use crate::HarvestError;

/// Harvest statistics summary
#[derive(Debug, Clone, Default)]
pub struct HarvestStatistics {
    /// Pages in the stored visited set
    pub pages_visited: u64,

    /// Pages still waiting in the stored frontier
    pub pages_queued: u64,

    /// Pages that failed in the most recent run
    pub pages_failed_last_run: u64,

    /// Image pages ever discovered
    pub images_discovered: u64,

    /// Image pages awaiting the next download batch
    pub images_pending: u64,

    /// Download outcomes recorded across all runs
    pub images_saved: u64,
    pub images_failed: u64,

    /// Number of runs recorded
    pub runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    let latest_run = storage.get_latest_run()?;

    let pages_failed_last_run = match &latest_run {
        Some(run) => storage.count_pages_in_run(run.id, PageState::Failed)?,
        None => 0,
    };

    Ok(HarvestStatistics {
        pages_visited: storage.count_visited()?,
        pages_queued: storage.count_frontier()?,
        pages_failed_last_run,
        images_discovered: storage.count_images(false)?,
        images_pending: storage.count_images(true)?,
        images_saved: storage.count_downloads(true)?,
        images_failed: storage.count_downloads(false)?,
        runs: storage.count_runs()?,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Crawl:");
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Pages queued: {}", stats.pages_queued);
    println!("  Pages failed (last run): {}", stats.pages_failed_last_run);
    println!();

    println!("Images:");
    println!("  Discovered: {}", stats.images_discovered);
    println!("  Pending download: {}", stats.images_pending);
    println!("  Saved: {}", stats.images_saved);
    println!("  Failed: {}", stats.images_failed);
    println!();

    println!("Runs recorded: {}", stats.runs);
    if let Some(run) = &stats.latest_run {
        println!(
            "  Latest: #{} {} (started {}{})",
            run.id,
            run.status.to_db_string(),
            run.started_at,
            run.finished_at
                .as_deref()
                .map(|finished| format!(", finished {}", finished))
                .unwrap_or_default()
        );
    }
    println!();

    let attempted = stats.images_saved + stats.images_failed;
    let success_rate = if attempted > 0 {
        (stats.images_saved as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Download Success Rate: {:.1}% ({} / {} images saved)",
        success_rate, stats.images_saved, attempted
    );
}
