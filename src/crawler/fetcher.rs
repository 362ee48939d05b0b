//! HTTP fetching for the crawler
//!
//! This module handles all HTTP requests, including:
//! - The `HttpFetch` capability and its reqwest implementation
//! - A fresh client identity on every request
//! - The process-wide politeness delay between page fetches
//! - Bounded retry with jitter for any failure
//! - Treating non-2xx responses as failures

use crate::config::Config;
use crate::crawler::{Cooldown, RetryPolicy, UserAgentPool};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header::USER_AGENT, redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;

/// Raw response from the HTTP capability
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, undecoded
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP capability: one GET with a caller-chosen identity
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status; only transport problems are errors at this level.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, user_agent: &str) -> Result<HttpResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout` - Total timeout per request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `HttpFetch` over a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str, user_agent: &str) -> Result<HttpResponse, FetchError> {
        let transport = |e: reqwest::Error| {
            let message = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchError::Transport {
                url: url.to_string(),
                message,
            }
        };

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// The crawler's only way to reach the network
///
/// Page fetches pass through the shared cooldown once per call and then
/// through the retry policy. Asset fetches skip the cooldown. Clones share
/// the cooldown clock.
#[derive(Clone)]
pub struct RateLimitedFetcher {
    http: Arc<dyn HttpFetch>,
    cooldown: Cooldown,
    retry: RetryPolicy,
    agents: UserAgentPool,
}

impl RateLimitedFetcher {
    pub fn new(
        http: Arc<dyn HttpFetch>,
        cooldown: Cooldown,
        retry: RetryPolicy,
        agents: UserAgentPool,
    ) -> Self {
        Self {
            http,
            cooldown,
            retry,
            agents,
        }
    }

    /// Builds the production fetcher from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(RateLimitedFetcher)` - Fetcher backed by reqwest
    /// * `Err(reqwest::Error)` - Failed to build the HTTP client
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(Duration::from_secs(config.crawler.request_timeout_secs))?;
        Ok(Self::new(
            Arc::new(ReqwestFetcher::new(client)),
            Cooldown::new(Duration::from_millis(config.crawler.fetch_delay_ms)),
            RetryPolicy::new(
                config.crawler.max_attempts,
                Duration::from_millis(config.crawler.max_jitter_ms),
            ),
            UserAgentPool::from_config(&config.user_agent),
        ))
    }

    /// Fetches an HTML page, honoring the politeness delay
    ///
    /// The delay is measured from the end of the previous page fetch and is
    /// waited once per call; retries inside the call are spaced by jitter only.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The page body, decoded lossily as UTF-8
    /// * `Err(FetchError::Exhausted)` - Every attempt failed
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let _slot = self.cooldown.wait().await;
        let body = self.retry.run(url, || self.attempt(url)).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetches binary content such as an image file
    pub async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.retry.run(url, || self.attempt(url)).await
    }

    /// One request with a freshly picked identity
    async fn attempt(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url, self.agents.pick()).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}

impl std::fmt::Debug for RateLimitedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedFetcher")
            .field("cooldown", &self.cooldown)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
