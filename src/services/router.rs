// src/services/router.rs

//! Per-source strategy selection.

use std::fmt;

use crate::error::Result;
use crate::models::{AcquisitionConfig, ScrapedItem, Source};
use crate::services::{Fetcher, ForumCrawler, RssFetcher, WebFetcher};

/// Host marker of anonymized-network sources.
const ANONYMIZED_MARKER: &str = ".onion";

/// URL fragments that suggest a feed.
const FEED_MARKERS: [&str; 3] = ["/feed", "/rss", ".xml"];

/// Acquisition strategy for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Deep-crawl only.
    Forum,
    /// Feed first, single-page scrape when the feed fails or is empty.
    FeedThenWeb,
    /// Single-page scrape only.
    Web,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Forum => "forum crawl",
            Strategy::FeedThenWeb => "feed, then web",
            Strategy::Web => "web",
        };
        f.write_str(name)
    }
}

/// Pick the strategy for a source URL. Matching is case-insensitive.
pub fn select_strategy(url: &str) -> Strategy {
    let lower = url.to_lowercase();
    if lower.contains(ANONYMIZED_MARKER) {
        Strategy::Forum
    } else if FEED_MARKERS.iter().any(|m| lower.contains(m)) {
        Strategy::FeedThenWeb
    } else {
        Strategy::Web
    }
}

/// Dispatches each source to the fetcher its strategy calls for.
pub struct SourceRouter {
    web: Box<dyn Fetcher>,
    feed: Box<dyn Fetcher>,
    forum: Box<dyn Fetcher>,
}

impl SourceRouter {
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        Ok(Self::with_fetchers(
            Box::new(WebFetcher::new(config)?),
            Box::new(RssFetcher::new(config)?),
            Box::new(ForumCrawler::new(config)?),
        ))
    }

    pub fn with_fetchers(
        web: Box<dyn Fetcher>,
        feed: Box<dyn Fetcher>,
        forum: Box<dyn Fetcher>,
    ) -> Self {
        Self { web, feed, forum }
    }

    /// Acquire raw items for one source.
    pub async fn acquire(&self, source: &Source) -> Result<Vec<ScrapedItem>> {
        let strategy = select_strategy(&source.url);
        log::debug!("[{}] strategy: {}", source.name, strategy);

        match strategy {
            Strategy::Forum => {
                log::info!("[{}] Deep crawling forum", source.name);
                self.forum.fetch(source).await
            }
            Strategy::FeedThenWeb => match self.feed.fetch(source).await {
                Ok(items) if !items.is_empty() => Ok(items),
                Ok(_) => {
                    log::debug!("[{}] Feed was empty, scraping page", source.name);
                    self.web.fetch(source).await
                }
                Err(e) => {
                    log::debug!("[{}] Feed failed ({}), scraping page", source.name, e);
                    self.web.fetch(source).await
                }
            },
            Strategy::Web => self.web.fetch(source).await,
        }
    }
}
