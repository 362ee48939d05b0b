//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind a politeness delay and retry policy
//! - Client identity rotation
//! - HTML link extraction and canonicalization
//! - The breadth-first crawl batch

mod analyzer;
mod cooldown;
mod coordinator;
mod fetcher;
mod parser;
mod retry;
mod user_agent;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::PageAnalyzer;
pub use cooldown::{Cooldown, CooldownSlot};
pub use coordinator::{crawl_batch, BatchStats, PageOutcome};
pub use fetcher::{build_http_client, HttpFetch, HttpResponse, RateLimitedFetcher, ReqwestFetcher};
pub use parser::{HtmlAnalyzer, PageAnalysis, RawLinks};
pub use retry::RetryPolicy;
pub use user_agent::UserAgentPool;

use crate::config::Config;
use crate::Result;
use std::sync::Arc;

/// Builds the production analyzer: reqwest transport, configured selectors
///
/// # Arguments
///
/// * `config` - A validated configuration
///
/// # Returns
///
/// * `Ok(PageAnalyzer)` - Ready to crawl `config.site.origin`
/// * `Err(HarvestError)` - The HTTP client, a selector, or the origin was invalid
pub fn build_analyzer(config: &Config) -> Result<PageAnalyzer> {
    let fetcher = RateLimitedFetcher::from_config(config)?;
    let analysis = HtmlAnalyzer::new(&config.selectors)?;
    let origin = ::url::Url::parse(&config.site.origin)
        .map_err(|e| crate::ConfigError::InvalidUrl(format!("{}: {}", config.site.origin, e)))?;
    Ok(PageAnalyzer::new(fetcher, Arc::new(analysis), origin))
}
