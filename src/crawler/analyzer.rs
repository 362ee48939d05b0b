//! Page analyzer adapter
//!
//! Glues the rate-limited fetcher to the page analysis capability and
//! canonicalizes everything it returns against the site origin.

use crate::crawler::{PageAnalysis, RateLimitedFetcher};
use crate::state::PageResult;
use crate::url::normalize;
use crate::{HarvestError, Result};
use ::url::Url;
use std::collections::HashSet;
use std::sync::Arc;

/// Fetch-then-extract for article pages and image-hosting pages
#[derive(Clone)]
pub struct PageAnalyzer {
    fetcher: RateLimitedFetcher,
    analysis: Arc<dyn PageAnalysis>,
    origin: Url,
}

impl PageAnalyzer {
    pub fn new(fetcher: RateLimitedFetcher, analysis: Arc<dyn PageAnalysis>, origin: Url) -> Self {
        Self {
            fetcher,
            analysis,
            origin,
        }
    }

    /// Canonicalizes a URL against the site origin
    pub fn canonical(&self, href: &str) -> String {
        normalize(href, &self.origin)
    }

    /// Fetches and analyzes one article page
    ///
    /// # Arguments
    ///
    /// * `url` - Canonical URL of the page
    ///
    /// # Returns
    ///
    /// * `Ok(PageResult)` - Canonical article and image links, duplicates removed
    /// * `Err(HarvestError::Fetch)` - The page could not be fetched
    /// * `Err(HarvestError::Analysis)` - The content could not be parsed into links
    pub async fn analyze(&self, url: &str) -> Result<PageResult> {
        let html = self.fetcher.fetch_page(url).await?;
        let raw = self
            .analysis
            .extract_links(&html)
            .map_err(|message| HarvestError::analysis(url, message))?;

        let article_links = self.canonical_set(&raw.articles);
        let image_links = self.canonical_set(&raw.images);

        tracing::info!(
            "{} pages and {} images found in {}",
            article_links.len(),
            image_links.len(),
            url
        );

        Ok(PageResult {
            url: url.to_string(),
            article_links,
            image_links,
        })
    }

    /// Finds the full-resolution asset behind an image-hosting page
    ///
    /// Uses the same politeness delay and retry policy as article pages.
    pub async fn resolve_image(&self, image_page: &str) -> Result<String> {
        let html = self.fetcher.fetch_page(image_page).await?;
        let href = self
            .analysis
            .extract_full_image(&html)
            .map_err(|message| HarvestError::analysis(image_page, message))?;
        Ok(self.canonical(&href))
    }

    /// Fetches the bytes of a resolved image asset
    pub async fn fetch_image(&self, asset_url: &str) -> Result<Vec<u8>> {
        Ok(self.fetcher.fetch_asset(asset_url).await?)
    }

    /// Canonicalizes hrefs, dropping ones that collapse onto an earlier entry
    fn canonical_set(&self, hrefs: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        hrefs
            .iter()
            .map(|href| self.canonical(href))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

impl std::fmt::Debug for PageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageAnalyzer")
            .field("fetcher", &self.fetcher)
            .field("origin", &self.origin.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::crawler::testing::{analyzer_for, StaticSite};
    use crate::crawler::HtmlAnalyzer;
    use crate::FetchError;

    const ORIGIN: &str = "https://www.example.com/";

    #[tokio::test]
    async fn test_analyze_canonicalizes_links() {
        let site = StaticSite::new().page(
            "https://www.example.com/Start",
            r##"<html><body>
                <a class="related-wh" href="/Tie-a-Tie?utm=1">a</a>
                <a class="related-wh" href="#/Tie-a-Tie">dup</a>
                <a class="related-wh" href="Bake-Bread#steps">b</a>
                <a class="image" href="/Image:Knot.jpg?x=2">i</a>
            </body></html>"##,
        );
        let analyzer = analyzer_for(site, ORIGIN);

        let result = analyzer.analyze("https://www.example.com/Start").await.unwrap();
        assert_eq!(result.url, "https://www.example.com/Start");
        assert_eq!(
            result.article_links,
            vec![
                "https://www.example.com/Tie-a-Tie",
                "https://www.example.com/Bake-Bread"
            ]
        );
        assert_eq!(result.image_links, vec!["https://www.example.com/Image:Knot.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_unchanged() {
        let analyzer = analyzer_for(StaticSite::new(), ORIGIN);
        let err = analyzer.analyze("https://www.example.com/Missing").await.unwrap_err();
        assert!(matches!(err, HarvestError::Fetch(FetchError::Exhausted { .. })));
    }

    #[tokio::test]
    async fn test_parse_error_becomes_analysis_error() {
        let site = StaticSite::new().page("https://www.example.com/Blank", "");
        let analyzer = analyzer_for(site, ORIGIN);
        let err = analyzer.analyze("https://www.example.com/Blank").await.unwrap_err();
        match err {
            HarvestError::Analysis { url, .. } => assert_eq!(url, "https://www.example.com/Blank"),
            other => panic!("expected analysis error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_image() {
        let site = StaticSite::new().page(
            "https://www.example.com/Image:Knot.jpg",
            r#"<div class="fullImageLink"><a href="/images/0/0a/Knot.jpg">full</a></div>"#,
        );
        let analyzer = analyzer_for(site, ORIGIN);
        let asset = analyzer
            .resolve_image("https://www.example.com/Image:Knot.jpg")
            .await
            .unwrap();
        assert_eq!(asset, "https://www.example.com/images/0/0a/Knot.jpg");
    }

    #[test]
    fn test_default_selectors_compile() {
        assert!(HtmlAnalyzer::new(&SelectorConfig::default()).is_ok());
    }
}
