//! Persistence of collected content.
//!
//! [`ContentStore`] is the contract a backend fulfils: an existence probe by
//! source URL and an atomic insert. [`PersistenceGateway`] wraps a store with
//! the collector's policies: a fail-open duplicate check and retried inserts.

pub mod local;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CandidateRecord, ContentItem};
use crate::utils::retry::RetryPolicy;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for content storage backends.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether an item with this source URL is already stored.
    async fn exists_by_url(&self, url: &str) -> Result<bool>;

    /// Store a candidate and its category links in one atomic step.
    ///
    /// Category names the store does not know are skipped with a warning.
    async fn insert(&self, candidate: &CandidateRecord) -> Result<ContentItem>;

    /// Release the backend.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Dedup and retry policies in front of a [`ContentStore`].
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn ContentStore>,
    retry: RetryPolicy,
}

impl PersistenceGateway {
    /// Gateway with three insert attempts and quadratic backoff.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_retry(store, RetryPolicy::quadratic())
    }

    pub fn with_retry(store: Arc<dyn ContentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Duplicate probe. A failing probe counts as "not a duplicate" so the
    /// item still gets an insert attempt.
    pub async fn is_duplicate(&self, url: &str) -> bool {
        match self.store.exists_by_url(url).await {
            Ok(exists) => exists,
            Err(e) => {
                log::warn!("Duplicate check failed for {}: {}", url, e);
                false
            }
        }
    }

    /// Insert a candidate, retrying per the gateway's policy.
    pub async fn persist(&self, candidate: &CandidateRecord) -> Result<ContentItem> {
        let store = &self.store;
        self.retry
            .run("insert content", move || store.insert(candidate))
            .await
    }

    pub async fn close(&self) -> Result<()> {
        self.store.close().await
    }
}
