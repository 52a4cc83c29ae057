//! Turns raw scraped items into candidate records.

use crate::models::{CandidateRecord, ScrapedItem};
use crate::pipeline::criticality::{categorize, score};
use crate::pipeline::title::synthesize_title;

/// Stateless content triage: title, categories, criticality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentProcessor;

impl ContentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Build the candidate record for one item.
    pub fn process(&self, item: &ScrapedItem) -> CandidateRecord {
        let mut title = synthesize_title(&item.content);
        if title.is_empty() {
            title = item.source.name.clone();
        }

        let categories = categorize(&item.content);
        let criticality_score = score(&item.content, &categories);

        CandidateRecord {
            title,
            source_name: item.source.name.clone(),
            source_url: item.source.url.clone(),
            content: item.content.clone(),
            published_at: item.published_at,
            criticality_score,
            categories,
        }
    }
}
