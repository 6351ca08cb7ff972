//! Sitemap-driven corpus discovery and page fetching.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;

use crate::error::IngestError;
use crate::models::{Document, IngestionConfig};
use crate::utils::text::{clean_text, extract_html_text, extract_html_title};

/// Discovers page URLs from a sitemap and fetches them as clean-text
/// documents.
pub struct SitemapSource {
    client: Client,
    exclude_paths: Vec<String>,
    language: String,
    loc_re: Regex,
}

impl SitemapSource {
    pub fn new(config: &IngestionConfig, language: impl Into<String>) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| IngestError::Sitemap(e.to_string()))?;

        Ok(Self {
            client,
            exclude_paths: config.exclude_paths.clone(),
            language: language.into(),
            loc_re: Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("static regex is valid"),
        })
    }

    /// Fetch the sitemap and return content page URLs, preserving sitemap
    /// order and dropping excluded paths and duplicates.
    pub async fn discover(&self, sitemap_url: &str) -> Result<Vec<String>, IngestError> {
        let response = self
            .client
            .get(sitemap_url)
            .send()
            .await
            .map_err(|e| IngestError::Sitemap(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IngestError::Sitemap(format!(
                "sitemap fetch returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IngestError::Sitemap(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        let mut urls = Vec::new();
        for captures in self.loc_re.captures_iter(&body) {
            let url = captures[1].trim().to_string();
            if url.is_empty() || self.is_excluded(&url) {
                continue;
            }
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        tracing::info!(count = urls.len(), "discovered sitemap URLs");
        Ok(urls)
    }

    /// Fetch one page and extract a clean-text document from it.
    pub async fn fetch_page(&self, url: &str) -> Result<Document, IngestError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            IngestError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            return Err(IngestError::Fetch {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let html = response.text().await.map_err(|e| IngestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let title = extract_html_title(&html);
        let content = clean_text(&extract_html_text(&html));

        Ok(Document::new(url, title, content, self.language.clone()))
    }

    fn is_excluded(&self, url: &str) -> bool {
        self.exclude_paths.iter().any(|path| url.contains(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SitemapSource {
        SitemapSource::new(&IngestionConfig::default(), "en").unwrap()
    }

    #[test]
    fn test_loc_extraction_and_filtering() {
        let s = source();
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc> https://book.example.com/chapter-1 </loc></url>
              <url><loc>https://book.example.com/blog/post</loc></url>
              <url><loc>https://book.example.com/chapter-2</loc></url>
              <url><loc>https://book.example.com/chapter-1</loc></url>
            </urlset>"#;

        let mut urls = Vec::new();
        for captures in s.loc_re.captures_iter(body) {
            let url = captures[1].trim().to_string();
            if !s.is_excluded(&url) && !urls.contains(&url) {
                urls.push(url);
            }
        }

        assert_eq!(
            urls,
            vec![
                "https://book.example.com/chapter-1",
                "https://book.example.com/chapter-2"
            ]
        );
    }

    #[test]
    fn test_exclusion_paths() {
        let s = source();
        assert!(s.is_excluded("https://book.example.com/blog/announcement"));
        assert!(s.is_excluded("https://book.example.com/api/v1/users"));
        assert!(!s.is_excluded("https://book.example.com/chapter-3"));
    }
}
