//! Content acquisition services.
//!
//! This module contains the strategies used to pull raw content from a source:
//! - Single-page scraping (`WebFetcher`)
//! - RSS/Atom feed fetching (`RssFetcher`)
//! - Paced forum deep-crawling (`ForumCrawler`)
//! - Per-source strategy selection (`SourceRouter`)

mod forum;
mod router;
mod rss;
mod web;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ScrapedItem, Source};

pub use forum::{ForumCrawler, LinkKind, classify_link, plan_crawl};
pub use router::{SourceRouter, Strategy, select_strategy};
pub use rss::{RssFetcher, parse_feed};
pub use web::WebFetcher;

/// One way of turning a configured source into raw items.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<ScrapedItem>>;
}
