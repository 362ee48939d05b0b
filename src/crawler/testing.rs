//! In-memory site for crawl engine tests

use crate::config::SelectorConfig;
use crate::crawler::{
    Cooldown, HtmlAnalyzer, HttpFetch, HttpResponse, PageAnalyzer, RateLimitedFetcher,
    RetryPolicy, UserAgentPool,
};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed responses keyed by URL; anything else is a 404
#[derive(Debug, Default)]
pub struct StaticSite {
    responses: HashMap<String, HttpResponse>,
    requests: Mutex<Vec<String>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.respond(url, 200, html.as_bytes().to_vec())
    }

    pub fn asset(self, url: &str, bytes: Vec<u8>) -> Self {
        self.respond(url, 200, bytes)
    }

    pub fn respond(mut self, url: &str, status: u16, body: Vec<u8>) -> Self {
        self.responses
            .insert(url.to_string(), HttpResponse { status, body });
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// How many times a URL was requested
    pub fn hits(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpFetch for StaticSite {
    async fn get(&self, url: &str, _user_agent: &str) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(self.responses.get(url).cloned().unwrap_or(HttpResponse {
            status: 404,
            body: Vec::new(),
        }))
    }
}

/// Fetcher with no delay, no jitter and two attempts
pub fn fetcher_for(site: Arc<StaticSite>) -> RateLimitedFetcher {
    RateLimitedFetcher::new(
        site,
        Cooldown::new(Duration::ZERO),
        RetryPolicy::new(2, Duration::ZERO),
        UserAgentPool::Fixed("Test/1.0".to_string()),
    )
}

/// Analyzer over the default selectors
pub fn analyzer_for(site: impl Into<Arc<StaticSite>>, origin: &str) -> PageAnalyzer {
    PageAnalyzer::new(
        fetcher_for(site.into()),
        Arc::new(HtmlAnalyzer::new(&SelectorConfig::default()).unwrap()),
        ::url::Url::parse(origin).unwrap(),
    )
}

/// Builds an article page linking to the given articles and image pages
pub fn article_html(articles: &[&str], images: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for href in articles {
        html.push_str(&format!(r#"<a class="related-wh" href="{}">a</a>"#, href));
    }
    for href in images {
        html.push_str(&format!(r#"<a class="image" href="{}">i</a>"#, href));
    }
    html.push_str("</body></html>");
    html
}

/// Builds an image-hosting page wrapping the given asset
pub fn image_page_html(asset: &str) -> String {
    format!(
        r#"<html><body><div class="fullImageLink"><a href="{}">full</a></div></body></html>"#,
        asset
    )
}
