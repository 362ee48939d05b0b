use crate::config::types::{
    Config, CrawlerConfig, DownloadConfig, OutputConfig, SelectorConfig, SiteConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::path::{Path, PathBuf};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_selector_config(&config.selectors)?;
    validate_crawler_config(&config.crawler)?;
    validate_download_config(&config.download)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Creates the image output directory if needed and checks it is a directory
///
/// # Returns
///
/// * `Ok(PathBuf)` - The directory exists (or was created)
/// * `Err(ConfigError::InvalidPath)` - The path is a file or cannot be created
pub fn prepare_output_directory(directory: &str) -> Result<PathBuf, ConfigError> {
    if directory.trim().is_empty() {
        return Err(ConfigError::InvalidPath(
            "download directory cannot be empty".to_string(),
        ));
    }

    let path = Path::new(directory);
    if path.exists() && !path.is_dir() {
        return Err(ConfigError::InvalidPath(format!(
            "'{}' exists and is not a directory",
            directory
        )));
    }

    std::fs::create_dir_all(path).map_err(|e| {
        ConfigError::InvalidPath(format!("cannot create '{}': {}", directory, e))
    })?;

    Ok(path.to_path_buf())
}

/// Validates the site origin and entrypoint
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let origin = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.scheme() != "http" && origin.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "origin '{}' must use http or https",
            config.origin
        )));
    }

    if origin.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "origin '{}' has no host",
            config.origin
        )));
    }

    Url::parse(&config.entrypoint).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid entrypoint '{}': {}",
            config.entrypoint, e
        ))
    })?;

    Ok(())
}

/// Validates the analyzer selectors
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.article_links.is_empty() {
        return Err(ConfigError::Validation(
            "at least one article-links selector is required".to_string(),
        ));
    }

    if config.image_links.is_empty() {
        return Err(ConfigError::Validation(
            "at least one image-links selector is required".to_string(),
        ));
    }

    for selector in config
        .article_links
        .iter()
        .chain(config.image_links.iter())
        .chain(std::iter::once(&config.full_image_link))
    {
        validate_selector(selector)?;
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(
            "selector cannot be empty".to_string(),
        ));
    }

    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if let Some(warning) = politeness_warning(config) {
        tracing::warn!("{}", warning);
    }

    Ok(())
}

/// Describes a fetch delay shorter than the default politeness budget
fn politeness_warning(config: &CrawlerConfig) -> Option<String> {
    let budget = CrawlerConfig::default().fetch_delay_ms;
    if config.fetch_delay_ms >= budget {
        return None;
    }
    Some(format!(
        "fetch-delay-ms = {} is below the {}ms politeness delay; the site may block the crawler",
        config.fetch_delay_ms, budget
    ))
}

/// Validates download configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if (config.crop_width == 0) != (config.crop_height == 0) {
        return Err(ConfigError::Validation(format!(
            "crop-width and crop-height must both be set or both be 0, got {}x{}",
            config.crop_width, config.crop_height
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    for agent in &config.agents {
        if agent.trim().is_empty() || agent.contains(['\r', '\n']) {
            return Err(ConfigError::Validation(format!(
                "invalid user agent entry: {:?}",
                agent
            )));
        }
    }

    if config.rotate {
        return Ok(());
    }

    // Identity string is only used when rotation is off
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
