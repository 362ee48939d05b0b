//! Pixel-Harvest: a polite single-site image dataset builder
//!
//! This crate crawls the article pages of one site breadth-first, collects the
//! full-resolution image links found on each page, and downloads those images
//! into a uniformly rescaled and cropped dataset. Crawl state is resumable
//! across batches and across process runs.

pub mod config;
pub mod crawler;
pub mod dataset;
pub mod download;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Pixel-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to analyze {url}: {message}")]
    Analysis { url: String, message: String },

    #[error("Image processing failed for {url}: {message}")]
    ImageProcessing { url: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl HarvestError {
    /// Builds an analysis error for the given page
    pub fn analysis(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Builds an image processing error for the given image
    pub fn image(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageProcessing {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Fetch failures, before and after the retry policy gives up
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// The URL this failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } | Self::Exhausted { url, .. } => {
                url
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Result type alias for Pixel-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{Dataset, SessionPlan, SessionSummary};
pub use state::{CrawlState, PageResult, PageState};
pub use crate::url::normalize;
