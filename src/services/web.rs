// src/services/web.rs

//! Single-page web scraper.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::{AcquisitionConfig, ScrapedItem, Source};
use crate::services::Fetcher;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::text::extract_text;

/// Fetches a source URL once and keeps its visible text.
pub struct WebFetcher {
    client: Client,
    max_chars: usize,
}

impl WebFetcher {
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        let client =
            create_async_client(config, Duration::from_secs(config.web_timeout_secs))?;
        Ok(Self {
            client,
            max_chars: config.max_content_chars,
        })
    }

    /// Scrape a single page. Pages carry no reliable timestamp, so the item
    /// is stamped with the fetch time.
    pub async fn scrape(&self, source: &Source) -> Result<ScrapedItem> {
        let body = fetch_text(&self.client, &source.url)
            .await
            .map_err(|e| AppError::fetch(&source.url, e))?;
        Ok(ScrapedItem {
            source: source.clone(),
            content: page_text(&body, self.max_chars),
            published_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Fetcher for WebFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<ScrapedItem>> {
        Ok(vec![self.scrape(source).await?])
    }
}

/// Visible text of an HTML body.
pub(crate) fn page_text(body: &str, max_chars: usize) -> String {
    let document = Html::parse_document(body);
    extract_text(&document, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::test_server;

    #[test]
    fn page_text_keeps_visible_text_only() {
        let body = r#"<html><body>
            <nav>Home</nav>
            <script>track()</script>
            <article>LockBit affiliate arrested.</article>
        </body></html>"#;
        assert_eq!(page_text(body, 5000), "Home LockBit affiliate arrested.");
    }

    #[tokio::test]
    async fn scrape_returns_one_item_with_page_text() {
        let base = test_server::serve(&[(
            "/news",
            200,
            "<html><body><h1>Patch now</h1><style>h1 {}</style></body></html>",
        )])
        .await;
        let source = Source::new("News", format!("{base}/news"));
        let fetcher = WebFetcher::new(&AcquisitionConfig::default()).unwrap();

        let items = fetcher.fetch(&source).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, source);
        assert_eq!(items[0].content, "Patch now");
    }

    #[tokio::test]
    async fn server_error_fails_the_scrape() {
        let base = test_server::serve(&[("/news", 500, "<p>oops</p>")]).await;
        let source = Source::new("News", format!("{base}/news"));
        let fetcher = WebFetcher::new(&AcquisitionConfig::default()).unwrap();

        let err = fetcher.scrape(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }), "{err}");
        assert!(err.to_string().contains("500"), "{err}");
    }

    #[test]
    fn new_uses_configured_limits() {
        let config = AcquisitionConfig {
            max_content_chars: 42,
            ..AcquisitionConfig::default()
        };
        let fetcher = WebFetcher::new(&config).unwrap();
        assert_eq!(fetcher.max_chars, 42);
    }
}
