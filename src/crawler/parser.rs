//! HTML link extraction
//!
//! This module is the page analysis capability: given raw markup it returns
//! the article hrefs, the image-page hrefs, or the full-resolution asset href
//! exactly as they appear in the document. Canonicalization happens later.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Raw hrefs found on an article page, deduplicated in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLinks {
    pub articles: Vec<String>,
    pub images: Vec<String>,
}

/// Page analysis capability
///
/// Errors are plain messages; the caller attaches the page URL.
pub trait PageAnalysis: Send + Sync {
    /// Extracts article and image hrefs from an article page
    fn extract_links(&self, html: &str) -> Result<RawLinks, String>;

    /// Extracts the full-resolution asset href from an image-hosting page
    fn extract_full_image(&self, html: &str) -> Result<String, String>;
}

/// `PageAnalysis` driven by configured CSS selectors
#[derive(Debug)]
pub struct HtmlAnalyzer {
    article_links: Vec<Selector>,
    image_links: Vec<Selector>,
    full_image_link: Selector,
    anchor: Selector,
}

impl HtmlAnalyzer {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(HtmlAnalyzer)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to parse
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            article_links: compile_all(&config.article_links)?,
            image_links: compile_all(&config.image_links)?,
            full_image_link: compile(&config.full_image_link)?,
            anchor: compile("a[href]")?,
        })
    }

    /// Finds the href carried by a matched element
    ///
    /// Anchors contribute their own `href`; any other element contributes
    /// the `href` of its first descendant anchor.
    fn href_of(&self, element: ElementRef<'_>) -> Option<String> {
        if let Some(href) = element.value().attr("href") {
            return Some(href.to_string());
        }
        element
            .select(&self.anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }

    fn collect(&self, document: &Html, selectors: &[Selector]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut hrefs = Vec::new();
        for selector in selectors {
            for element in document.select(selector) {
                let Some(href) = self.href_of(element) else {
                    continue;
                };
                if !is_followable(&href) {
                    continue;
                }
                if seen.insert(href.clone()) {
                    hrefs.push(href);
                }
            }
        }
        hrefs
    }
}

impl PageAnalysis for HtmlAnalyzer {
    fn extract_links(&self, html: &str) -> Result<RawLinks, String> {
        if html.trim().is_empty() {
            return Err("empty document".to_string());
        }
        let document = Html::parse_document(html);
        Ok(RawLinks {
            articles: self.collect(&document, &self.article_links),
            images: self.collect(&document, &self.image_links),
        })
    }

    fn extract_full_image(&self, html: &str) -> Result<String, String> {
        if html.trim().is_empty() {
            return Err("empty document".to_string());
        }
        let document = Html::parse_document(html);
        document
            .select(&self.full_image_link)
            .find_map(|element| self.href_of(element))
            .filter(|href| is_followable(href))
            .ok_or_else(|| "no full-resolution image link".to_string())
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

fn compile_all(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors.iter().map(|s| compile(s)).collect()
}

/// Rejects hrefs that can never name a page or image on the site
///
/// Excludes empty hrefs and the javascript:, mailto:, tel: and data: schemes.
fn is_followable(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }
    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}
