//! Image download and processing
//!
//! - `imaging`: rescale, center crop and save
//! - `orchestrator`: the bounded worker pool draining pending image pages

pub mod imaging;
mod orchestrator;

pub use imaging::Transform;
pub use orchestrator::{download_batch, DownloadOptions, DownloadReport, ImageOutcome};
