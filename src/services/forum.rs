// src/services/forum.rs

//! Forum deep-crawler.
//!
//! The front page of a forum says little on its own, so the crawler collects
//! same-host thread and board links from it and visits them one at a time
//! with a fixed pause in between.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AcquisitionConfig, ScrapedItem, Source};
use crate::services::Fetcher;
use crate::services::web::page_text;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::{normalize_link, same_host};

/// Link substrings that mark account pages, search and static assets.
const DENYLIST: [&str; 20] = [
    "login",
    "register",
    "logout",
    "search",
    "profile",
    "memberlist",
    "ucp",
    "faq",
    "terms",
    "privacy",
    "user-",
    "member.php",
    "user.php",
    "member/",
    ".css",
    ".js",
    ".png",
    ".jpg",
    ".gif",
    ".ico",
];

const THREAD_PATTERNS: [&str; 6] = ["thread", "topic", "post", "discussion", "tid=", "topic="];

const BOARD_PATTERNS: [&str; 4] = ["forum", "board", "category", "fid="];

/// What an accepted forum link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Thread,
    Board,
}

/// Classify a link by its lowercase form. `None` means the link is not
/// worth crawling.
pub fn classify_link(url: &str) -> Option<LinkKind> {
    let lower = url.to_lowercase();
    if DENYLIST.iter().any(|p| lower.contains(p)) {
        None
    } else if THREAD_PATTERNS.iter().any(|p| lower.contains(p)) {
        Some(LinkKind::Thread)
    } else if BOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        Some(LinkKind::Board)
    } else {
        None
    }
}

/// Build the crawl list from a front page: same-host links only, each
/// visited once, threads before boards, at most `max_links` entries.
pub fn plan_crawl(body: &str, base: &Url, max_links: usize) -> Vec<Url> {
    let document = Html::parse_document(body);
    let mut visited = HashSet::new();
    let mut threads = Vec::new();
    let mut boards = Vec::new();

    let anchors = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .filter_map(|el| el.value().attr("href"));

    for href in anchors {
        let Some(link) = normalize_link(base, href) else {
            continue;
        };
        if !same_host(&link, base) || !visited.insert(link.to_string()) {
            continue;
        }
        match classify_link(link.as_str()) {
            Some(LinkKind::Thread) => threads.push(link),
            Some(LinkKind::Board) => boards.push(link),
            None => {}
        }
    }

    threads.extend(boards);
    threads.truncate(max_links);
    threads
}

/// Visit `links` in order, sleeping `delay` between visits. Links whose
/// visit yields nothing are left out of the result.
pub async fn visit_paced<T, F, Fut>(links: Vec<Url>, delay: Duration, mut visit: F) -> Vec<T>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let mut results = Vec::new();
    for (idx, link) in links.into_iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(delay).await;
        }
        if let Some(item) = visit(link).await {
            results.push(item);
        }
    }
    results
}

/// Deep-crawls forum sources through the configured transport.
pub struct ForumCrawler {
    client: Client,
    max_links: usize,
    delay: Duration,
    max_chars: usize,
}

impl ForumCrawler {
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        let client =
            create_async_client(config, Duration::from_secs(config.forum_timeout_secs))?;
        Ok(Self {
            client,
            max_links: config.forum_max_links,
            delay: config.forum_delay(),
            max_chars: config.max_content_chars,
        })
    }

    /// Crawl a forum. Only a failure on the front page is an error.
    pub async fn crawl(&self, source: &Source) -> Result<Vec<ScrapedItem>> {
        let base = Url::parse(&source.url)?;
        let front = fetch_text(&self.client, &source.url)
            .await
            .map_err(|e| AppError::fetch(&source.url, e))?;
        let links = plan_crawl(&front, &base, self.max_links);
        log::info!("[{}] {} forum links to crawl", source.name, links.len());

        let items = visit_paced(links, self.delay, |link| self.visit(source, link)).await;
        log::info!("[{}] {} forum pages collected", source.name, items.len());
        Ok(items)
    }

    async fn visit(&self, source: &Source, link: Url) -> Option<ScrapedItem> {
        let body = match fetch_text(&self.client, link.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                log::debug!("Skipping {}: {}", link, e);
                return None;
            }
        };

        let content = page_text(&body, self.max_chars);
        if content.is_empty() {
            log::debug!("Skipping {}: no text", link);
            return None;
        }

        Some(ScrapedItem {
            source: Source::new(source.name.clone(), link.to_string()),
            content,
            published_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Fetcher for ForumCrawler {
    async fn fetch(&self, source: &Source) -> Result<Vec<ScrapedItem>> {
        self.crawl(source).await
    }
}
