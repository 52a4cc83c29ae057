//! Configured sources and the raw items fetched from them.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// A configured content origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Display name, also used as a fallback title
    pub name: String,

    /// Page, feed or forum front-page URL
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Load the source list from a JSON array of `{name, url}` objects.
    ///
    /// An empty list or an entry with an unparsable URL is an error.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Cannot read sources file {}: {e}", path.display()))
        })?;
        let sources: Vec<Self> = serde_json::from_str(&content)?;

        if sources.is_empty() {
            return Err(AppError::config(format!(
                "No sources configured in {}",
                path.display()
            )));
        }
        for source in &sources {
            source.validate()?;
        }
        Ok(sources)
    }

    /// Check that the source has a name and an absolute URL.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Source with URL {} has no name",
                self.url
            )));
        }
        Url::parse(&self.url).map_err(|e| {
            AppError::validation(format!("Source '{}' has invalid URL: {e}", self.name))
        })?;
        Ok(())
    }
}

/// Plain-text content fetched from a source, before processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedItem {
    /// Origin of the item; for feed entries and forum threads the URL is the
    /// entry's own link rather than the configured one
    pub source: Source,

    /// Extracted plain text, already bounded in length
    pub content: String,

    pub published_at: DateTime<Utc>,
}
