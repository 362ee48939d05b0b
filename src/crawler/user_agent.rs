//! Client identity selection
//!
//! With rotation on, every request carries a randomly chosen browser
//! identity. With rotation off, every request carries the crawler's own
//! identity string.

use crate::config::UserAgentConfig;
use rand::seq::SliceRandom;

const BROWSER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
];

/// Source of the `User-Agent` header for each request
#[derive(Debug, Clone)]
pub enum UserAgentPool {
    /// Pick one of these at random per request
    Rotating(Vec<String>),

    /// Always send this identity
    Fixed(String),
}

impl UserAgentPool {
    /// Builds the pool described by the configuration
    ///
    /// An empty `agents` list selects the built-in browser pool.
    pub fn from_config(config: &UserAgentConfig) -> Self {
        if !config.rotate {
            // Format: CrawlerName/Version (+ContactURL)
            return Self::Fixed(format!(
                "{}/{} (+{})",
                config.crawler_name, config.crawler_version, config.contact_url
            ));
        }

        if config.agents.is_empty() {
            Self::Rotating(BROWSER_AGENTS.iter().map(|s| s.to_string()).collect())
        } else {
            Self::Rotating(config.agents.clone())
        }
    }

    /// Returns the identity for the next request
    pub fn pick(&self) -> &str {
        match self {
            Self::Fixed(agent) => agent.as_str(),
            Self::Rotating(agents) => agents
                .choose(&mut rand::thread_rng())
                .map(String::as_str)
                .unwrap_or(BROWSER_AGENTS[0]),
        }
    }
}
