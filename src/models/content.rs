//! Processed and persisted content records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored, categorized record ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub title: String,
    pub source_name: String,

    /// Dedup key: at most one persisted item per URL
    pub source_url: String,

    pub content: String,
    pub published_at: DateTime<Utc>,

    /// Severity in `1..=10`
    pub criticality_score: u8,

    /// Category names, resolved to ids by the store
    pub categories: Vec<String>,
}

/// A record as stored by a [`ContentStore`](crate::storage::ContentStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    pub title: String,
    pub source_name: String,
    pub source_url: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub criticality_score: u8,
    pub collected_at: DateTime<Utc>,

    /// Ids of the categories that resolved at insert time
    #[serde(default)]
    pub category_ids: Vec<u64>,
}

impl ContentItem {
    pub fn from_candidate(
        id: u64,
        candidate: &CandidateRecord,
        category_ids: Vec<u64>,
        collected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: candidate.title.clone(),
            source_name: candidate.source_name.clone(),
            source_url: candidate.source_url.clone(),
            content: candidate.content.clone(),
            published_at: candidate.published_at,
            criticality_score: candidate.criticality_score,
            collected_at,
            category_ids,
        }
    }
}

/// A category known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}
