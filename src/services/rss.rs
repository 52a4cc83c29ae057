// src/services/rss.rs

//! RSS and Atom feed fetcher.
//!
//! Entries are read with a streaming XML reader. Element names are matched on
//! their local part, so `content:encoded` counts as the encoded-content field.
//! A body that is not well-formed XML fails the whole fetch.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{AcquisitionConfig, ScrapedItem, Source};
use crate::services::Fetcher;
use crate::utils::date::normalize_date;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::text::strip_tags;

/// Fetches a feed and turns each entry into an item.
pub struct RssFetcher {
    client: Client,
    max_chars: usize,
}

impl RssFetcher {
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        let client =
            create_async_client(config, Duration::from_secs(config.web_timeout_secs))?;
        Ok(Self {
            client,
            max_chars: config.max_content_chars,
        })
    }

    pub async fn fetch_feed(&self, source: &Source) -> Result<Vec<ScrapedItem>> {
        let body = fetch_text(&self.client, &source.url)
            .await
            .map_err(|e| AppError::fetch(&source.url, e))?;
        parse_feed(&body, source, self.max_chars)
    }
}

#[async_trait]
impl Fetcher for RssFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<ScrapedItem>> {
        self.fetch_feed(source).await
    }
}

/// Entry fields the fetcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Link,
    Encoded,
    Description,
    Published,
    Updated,
}

#[derive(Debug, Default)]
struct RawEntry {
    link: String,
    encoded: String,
    description: String,
    published: String,
    updated: String,
}

impl RawEntry {
    fn buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::Link => &mut self.link,
            Field::Encoded => &mut self.encoded,
            Field::Description => &mut self.description,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        }
    }

    fn into_item(self, source: &Source, max_chars: usize) -> ScrapedItem {
        let markup = if self.encoded.trim().is_empty() {
            &self.description
        } else {
            &self.encoded
        };
        let date = if self.published.trim().is_empty() {
            &self.updated
        } else {
            &self.published
        };

        let link = self.link.trim();
        let url = if link.is_empty() {
            log::debug!("Feed entry without link in {}, keeping feed URL", source.url);
            source.url.clone()
        } else {
            link.to_string()
        };

        ScrapedItem {
            source: Source::new(source.name.clone(), url),
            content: strip_tags(markup, max_chars),
            published_at: normalize_date(date),
        }
    }
}

/// Parse an RSS (`channel/item`) or Atom (`feed/entry`) document.
pub fn parse_feed(body: &str, source: &Source, max_chars: usize) -> Result<Vec<ScrapedItem>> {
    let malformed = |message: &dyn std::fmt::Display| AppError::feed(&source.url, message);

    let mut reader = Reader::from_str(body);
    let mut entries = Vec::new();
    let mut entry: Option<RawEntry> = None;
    let mut field: Option<(Field, usize)> = None;
    let mut depth = 0usize;
    let mut entry_depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event().map_err(|e| malformed(&e))? {
            Event::Start(start) => {
                depth += 1;
                saw_root = true;
                let local = start.local_name();

                if entry.is_none() && is_entry(local.as_ref()) {
                    entry = Some(RawEntry::default());
                    entry_depth = depth;
                } else if let (Some(current), None) = (entry.as_mut(), field) {
                    if let Some(kind) = field_for(&start) {
                        if kind == Field::Link {
                            take_href(current, &start);
                        }
                        field = Some((kind, depth));
                    }
                }
            }
            Event::Empty(start) => {
                saw_root = true;
                if let Some(current) = entry.as_mut() {
                    if field.is_none() && field_for(&start) == Some(Field::Link) {
                        take_href(current, &start);
                    }
                }
            }
            Event::Text(text) => {
                if let (Some(current), Some((kind, _))) = (entry.as_mut(), field) {
                    let text = text.unescape().map_err(|e| malformed(&e))?;
                    current.buffer(kind).push_str(&text);
                }
            }
            Event::CData(data) => {
                if let (Some(current), Some((kind, _))) = (entry.as_mut(), field) {
                    let bytes = data.into_inner();
                    current
                        .buffer(kind)
                        .push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                if field.is_some_and(|(_, at)| at == depth) {
                    field = None;
                }
                if entry.is_some() && depth == entry_depth {
                    if let Some(done) = entry.take() {
                        entries.push(done.into_item(source, max_chars));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(malformed(&"document has no root element"));
    }
    if depth != 0 {
        return Err(malformed(&"unexpected end of document"));
    }
    Ok(entries)
}

fn is_entry(local: &[u8]) -> bool {
    local == b"item" || local == b"entry"
}

fn field_for(start: &BytesStart<'_>) -> Option<Field> {
    let name = start.name();
    let unprefixed = name.prefix().is_none();
    match name.local_name().as_ref() {
        b"encoded" => Some(Field::Encoded),
        b"content" if unprefixed => Some(Field::Encoded),
        b"description" | b"summary" if unprefixed => Some(Field::Description),
        b"link" if unprefixed => Some(Field::Link),
        b"pubDate" | b"published" if unprefixed => Some(Field::Published),
        b"updated" if unprefixed => Some(Field::Updated),
        _ => None,
    }
}

/// Atom links carry the target in `href`; only `alternate` links count.
fn take_href(entry: &mut RawEntry, start: &BytesStart<'_>) {
    if !entry.link.trim().is_empty() {
        return;
    }
    let rel = attribute(start, "rel");
    if rel.as_deref().is_some_and(|rel| rel != "alternate") {
        return;
    }
    if let Some(href) = attribute(start, "href") {
        entry.link = href;
    }
}

fn attribute(start: &BytesStart<'_>, key: &str) -> Option<String> {
    start
        .try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::utils::http::test_server;

    fn feed_source() -> Source {
        Source::new("Vendor Blog", "https://blog.example.com/feed")
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Vendor Blog</title>
    <link>https://blog.example.com/</link>
    <item>
      <title>New ransomware strain</title>
      <link>https://blog.example.com/posts/ransomware-strain</link>
      <description>Short teaser</description>
      <content:encoded><![CDATA[<p>A new <b>ransomware</b> strain   encrypts NAS devices.</p>]]></content:encoded>
      <pubDate>Tue, 05 Mar 2024 14:07:09 +0000</pubDate>
    </item>
    <item>
      <title>Patch Tuesday</title>
      <link>https://blog.example.com/posts/patch-tuesday</link>
      <description>&lt;p&gt;Fixes for &lt;i&gt;three&lt;/i&gt; CVEs.&lt;/p&gt;</description>
      <pubDate>sometime last week</pubDate>
    </item>
  </channel>
</rss>"#;

    #[tokio::test]
    async fn fetch_feed_reads_served_feed() {
        let base = test_server::serve(&[("/feed", 200, RSS)]).await;
        let source = Source::new("Vendor Blog", format!("{base}/feed"));
        let fetcher = RssFetcher::new(&AcquisitionConfig::default()).unwrap();

        let items = fetcher.fetch_feed(&source).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source.url, "https://blog.example.com/posts/ransomware-strain");
    }

    #[tokio::test]
    async fn missing_feed_is_a_fetch_error() {
        let base = test_server::serve(&[]).await;
        let source = Source::new("Vendor Blog", format!("{base}/feed"));
        let fetcher = RssFetcher::new(&AcquisitionConfig::default()).unwrap();

        let err = fetcher.fetch_feed(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }), "{err}");
        assert!(err.to_string().contains("404"), "{err}");
    }

    #[test]
    fn parses_rss_items() {
        let before = Utc::now();
        let items = parse_feed(RSS, &feed_source(), 5000).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(
            items[0].source.url,
            "https://blog.example.com/posts/ransomware-strain"
        );
        assert_eq!(items[0].source.name, "Vendor Blog");
        assert_eq!(
            items[0].content,
            "A new ransomware strain encrypts NAS devices."
        );
        assert_eq!(
            items[0].published_at,
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
        );

        assert_eq!(items[1].content, "Fixes for three CVEs.");
        assert!(items[1].published_at >= before);
    }

    #[test]
    fn parses_atom_entries() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>CERT</title>
  <updated>2024-03-06T00:00:00Z</updated>
  <entry>
    <title>Advisory</title>
    <link rel="self" href="https://cert.example.org/api/1"/>
    <link href="https://cert.example.org/advisories/1"/>
    <updated>2024-03-05T14:07:09Z</updated>
    <summary type="html">Exploit &lt;b&gt;in the wild&lt;/b&gt;</summary>
  </entry>
</feed>"#;
        let items = parse_feed(atom, &feed_source(), 5000).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source.url, "https://cert.example.org/advisories/1");
        assert_eq!(items[0].content, "Exploit in the wild");
        assert_eq!(
            items[0].published_at,
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
        );
    }

    #[test]
    fn entry_without_link_keeps_feed_url() {
        let rss = "<rss><channel><item><description>No link</description></item></channel></rss>";
        let items = parse_feed(rss, &feed_source(), 5000).unwrap();
        assert_eq!(items[0].source.url, "https://blog.example.com/feed");
    }

    #[test]
    fn empty_channel_yields_no_items() {
        let rss = "<rss><channel><title>Quiet</title></channel></rss>";
        assert!(parse_feed(rss, &feed_source(), 5000).unwrap().is_empty());
    }

    #[test]
    fn content_is_truncated() {
        let long = "word ".repeat(2000);
        let rss = format!("<rss><channel><item><description>{long}</description></item></channel></rss>");
        let items = parse_feed(&rss, &feed_source(), 5000).unwrap();
        assert_eq!(items[0].content.chars().count(), 5000);
    }

    #[test]
    fn malformed_xml_is_a_hard_error() {
        let broken = "<rss><channel><item><description>ok</description></item><item></channel></rss>";
        assert!(matches!(
            parse_feed(broken, &feed_source(), 5000),
            Err(AppError::Feed { .. })
        ));

        let truncated = "<rss><channel><item><description>cut";
        assert!(parse_feed(truncated, &feed_source(), 5000).is_err());

        assert!(parse_feed("", &feed_source(), 5000).is_err());
    }

    #[test]
    fn html_page_is_not_a_feed() {
        let html = r#"<html><head><meta charset="utf-8"><title>Blog</title></head><body></body></html>"#;
        assert!(parse_feed(html, &feed_source(), 5000).is_err());
    }
}
