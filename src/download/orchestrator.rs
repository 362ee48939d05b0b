//! Download orchestrator
//!
//! Drains a snapshot of pending image pages through the pipeline
//! resolve -> fetch -> transform -> save, across a bounded worker pool.
//! Every image is independent: a failure at any step is logged and recorded
//! for that image only.

use crate::config::DownloadConfig;
use crate::crawler::PageAnalyzer;
use crate::download::imaging::{self, Transform};
use crate::url::file_stem;
use crate::{HarvestError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Settings for one download batch
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub transform: Transform,
    pub destination: PathBuf,
    /// Worker pool size; 1 means strictly sequential
    pub parallelism: usize,
}

impl DownloadOptions {
    /// Builds the options from the `[download]` section
    ///
    /// `destination` is the already prepared output directory.
    pub fn from_config(config: &DownloadConfig, destination: PathBuf) -> Self {
        Self {
            transform: Transform::new(config.rescale, config.crop_width, config.crop_height),
            destination,
            parallelism: config.workers.max(1) as usize,
        }
    }
}

/// Result of processing one pending image page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    /// The image-hosting page URL taken from the pending set
    pub image_page: String,

    /// Where the processed image was written, or why it was not
    pub result: std::result::Result<PathBuf, String>,
}

/// Aggregated outcomes of a download batch
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<ImageOutcome>,
}

impl DownloadReport {
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }
}

/// Processes every image page in `pending`
///
/// Never fails as a whole; per-image errors are captured in the report.
/// The caller owns the pending set and clears it once this returns.
///
/// # Arguments
///
/// * `pending` - Snapshot of the pending image pages
/// * `analyzer` - Resolves image pages and fetches assets
/// * `options` - Transform, destination directory and pool size
pub async fn download_batch(
    pending: Vec<String>,
    analyzer: &PageAnalyzer,
    options: &DownloadOptions,
) -> DownloadReport {
    tracing::info!(
        "Downloading {} images into {}",
        pending.len(),
        options.destination.display()
    );

    let outcomes = if options.parallelism <= 1 {
        let mut outcomes = Vec::with_capacity(pending.len());
        for image_page in pending {
            outcomes.push(run_one(analyzer, image_page, options).await);
        }
        outcomes
    } else {
        run_pool(pending, analyzer, options).await
    };

    let report = DownloadReport { outcomes };
    tracing::info!(
        "Download batch done: {} saved, {} failed",
        report.saved(),
        report.failed()
    );
    report
}

async fn run_pool(
    pending: Vec<String>,
    analyzer: &PageAnalyzer,
    options: &DownloadOptions,
) -> Vec<ImageOutcome> {
    let semaphore = Arc::new(Semaphore::new(options.parallelism));
    let mut handles = Vec::with_capacity(pending.len());

    for image_page in pending {
        let semaphore = Arc::clone(&semaphore);
        let analyzer = analyzer.clone();
        let options = options.clone();
        let page = image_page.clone();

        let handle = tokio::spawn(async move {
            // Held until the pipeline finishes
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return ImageOutcome {
                        image_page: page,
                        result: Err("worker pool closed".to_string()),
                    }
                }
            };
            run_one(&analyzer, page, &options).await
        });
        handles.push((image_page, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (image_page, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::warn!("Download task for {} panicked: {}", image_page, e);
                outcomes.push(ImageOutcome {
                    image_page,
                    result: Err(format!("task failed: {}", e)),
                });
            }
        }
    }
    outcomes
}

async fn run_one(analyzer: &PageAnalyzer, image_page: String, options: &DownloadOptions) -> ImageOutcome {
    tracing::debug!(
        "Downloading and processing {} (rescale {}, crop {:?})",
        image_page,
        options.transform.rescale_to,
        options.transform.crop_to
    );

    let result = process_image(analyzer, &image_page, options.transform, &options.destination)
        .await
        .map_err(|e| {
            tracing::warn!("Error trying to download image from {}: {}", image_page, e);
            e.to_string()
        });

    if let Ok(path) = &result {
        tracing::debug!("Saved {} as {}", image_page, path.display());
    }

    ImageOutcome { image_page, result }
}

/// Resolve, fetch, transform and save a single image
async fn process_image(
    analyzer: &PageAnalyzer,
    image_page: &str,
    transform: Transform,
    destination: &Path,
) -> Result<PathBuf> {
    let asset = analyzer.resolve_image(image_page).await?;
    let bytes = analyzer.fetch_image(&asset).await?;
    let stem = file_stem(&asset)
        .ok_or_else(|| HarvestError::image(&asset, "cannot derive a file name"))?;

    let destination = destination.to_path_buf();
    let asset_for_task = asset.clone();
    tokio::task::spawn_blocking(move || {
        let img = transform
            .apply(&bytes)
            .map_err(|e| HarvestError::image(&asset_for_task, e.to_string()))?;
        imaging::save(&img, &destination, &stem)
            .map_err(|e| HarvestError::image(&asset_for_task, e.to_string()))
    })
    .await
    .map_err(|e| HarvestError::image(&asset, e.to_string()))?
}
