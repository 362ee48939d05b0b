use serde::Deserialize;

/// Main configuration structure for Pixel-Harvest
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the defaults below, which target wikiHow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub selectors: SelectorConfig,
    pub crawler: CrawlerConfig,
    pub download: DownloadConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// The single site being harvested
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base every href is canonicalized against
    pub origin: String,

    /// Seed page used when no explicit start is given and nothing is stored
    pub entrypoint: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "https://www.wikihow.com/".to_string(),
            entrypoint: "https://www.wikihow.com/Main-Page".to_string(),
        }
    }
}

/// CSS selectors handed to the page analyzer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Elements whose `href` (or whose first descendant link) points at another article
    #[serde(rename = "article-links")]
    pub article_links: Vec<String>,

    /// Anchors whose `href` points at an image-hosting page
    #[serde(rename = "image-links")]
    pub image_links: Vec<String>,

    /// Anchor on the image-hosting page that wraps the full-resolution asset
    #[serde(rename = "full-image-link")]
    pub full_image_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            article_links: vec!["a.related-wh".to_string(), "div.hp_thumb a".to_string()],
            image_links: vec!["a.image".to_string()],
            full_image_link: "div.fullImageLink a".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum spacing between page fetches, process-wide (milliseconds)
    #[serde(rename = "fetch-delay-ms")]
    pub fetch_delay_ms: u64,

    /// Total attempts per fetch, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Upper bound of the random wait between attempts (milliseconds)
    #[serde(rename = "max-jitter-ms")]
    pub max_jitter_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Pages to visit in the whole session (0 = no limit)
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Images to discover in the whole session (0 = no limit)
    #[serde(rename = "max-images")]
    pub max_images: u32,

    /// Pages per crawl batch before a download pass runs (0 = crawl everything first)
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Forget visited pages and discovered images once at the start of each session
    #[serde(rename = "from-scratch")]
    pub from_scratch: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_delay_ms: 3000,
            max_attempts: 3,
            max_jitter_ms: 2000,
            request_timeout_secs: 30,
            max_pages: 1,
            max_images: 0,
            batch_size: 1,
            from_scratch: false,
        }
    }
}

/// Image download and transform configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory the processed images are written to
    pub directory: String,

    /// Size of the smaller dimension after resizing (0 = keep original size)
    pub rescale: u32,

    /// Width after center crop (0 = no crop)
    #[serde(rename = "crop-width")]
    pub crop_width: u32,

    /// Height after center crop (0 = no crop)
    #[serde(rename = "crop-height")]
    pub crop_height: u32,

    /// Size of the download worker pool
    pub workers: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: "./data".to_string(),
            rescale: 512,
            crop_width: 512,
            crop_height: 512,
            workers: 1,
        }
    }
}

/// User agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Pick a random browser identity for every request
    pub rotate: bool,

    /// Identities to rotate through (empty = built-in browser pool)
    pub agents: Vec<String>,

    /// Name of the crawler, used when rotation is off
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler, used when rotation is off
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler, used when rotation is off
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            rotate: true,
            agents: Vec::new(),
            crawler_name: "PixelHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/pixel-harvest/pixel-harvest".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database holding the resumable crawl state
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./pixel-harvest.db".to_string(),
        }
    }
}
