// src/pipeline/collect.rs

//! One collection cycle: every source, every item, strictly in order.

use std::fmt;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::Result;
use crate::models::{ScrapedItem, Source};
use crate::pipeline::ContentProcessor;
use crate::services::SourceRouter;
use crate::storage::PersistenceGateway;

/// What happened to one item (or to a whole source that failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Inserted,
    Duplicate,
    Failed(String),
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Inserted => f.write_str("inserted"),
            ItemStatus::Duplicate => f.write_str("duplicate"),
            ItemStatus::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub source_name: String,
    pub url: String,
    /// Empty for source-level failures
    pub title: String,
    /// 0 for source-level failures
    pub score: u8,
    pub status: ItemStatus,
}

/// Counters and per-item outcomes of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub successes: usize,
    pub errors: usize,
    pub duplicates: usize,
    pub sources_visited: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl CycleReport {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome.status {
            ItemStatus::Inserted => self.successes += 1,
            ItemStatus::Duplicate => self.duplicates += 1,
            ItemStatus::Failed(_) => self.errors += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Unit of work the scheduler drives.
#[async_trait]
pub trait CollectionJob: Send + Sync {
    async fn run_cycle(&self) -> Result<CycleReport>;
}

/// Runs collection cycles over a fixed source list.
pub struct Collector {
    sources: Vec<Source>,
    router: SourceRouter,
    processor: ContentProcessor,
    gateway: PersistenceGateway,
}

impl Collector {
    pub fn new(sources: Vec<Source>, router: SourceRouter, gateway: PersistenceGateway) -> Self {
        Self {
            sources,
            router,
            processor: ContentProcessor::new(),
            gateway,
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Acquire, triage and persist everything once. Failures are counted in
    /// the report and never abort the cycle.
    pub async fn collect(&self) -> CycleReport {
        let started = Instant::now();
        log::info!("Starting collection cycle over {} sources", self.sources.len());

        let mut report = CycleReport::default();
        for source in &self.sources {
            report.sources_visited += 1;

            let items = match self.router.acquire(source).await {
                Ok(items) => items,
                Err(e) => {
                    log::error!("[{}] Acquisition failed: {}", source.name, e);
                    report.record(ItemOutcome {
                        source_name: source.name.clone(),
                        url: source.url.clone(),
                        title: String::new(),
                        score: 0,
                        status: ItemStatus::Failed(e.to_string()),
                    });
                    continue;
                }
            };

            log::info!("[{}] {} items acquired", source.name, items.len());
            for item in &items {
                let outcome = self.handle_item(item).await;
                report.record(outcome);
            }
        }

        log::info!(
            "Collection cycle finished in {:.1?}: {} inserted, {} duplicates, {} errors",
            started.elapsed(),
            report.successes,
            report.duplicates,
            report.errors
        );
        report
    }

    async fn handle_item(&self, item: &ScrapedItem) -> ItemOutcome {
        let record = self.processor.process(item);
        let mut outcome = ItemOutcome {
            source_name: record.source_name.clone(),
            url: record.source_url.clone(),
            title: record.title.clone(),
            score: record.criticality_score,
            status: ItemStatus::Inserted,
        };

        if self.gateway.is_duplicate(&record.source_url).await {
            log::debug!("Skipping duplicate {}", record.source_url);
            outcome.status = ItemStatus::Duplicate;
            return outcome;
        }

        match self.gateway.persist(&record).await {
            Ok(stored) => {
                log::info!(
                    "Stored #{} \"{}\" from {} (score {}, categories {:?})",
                    stored.id,
                    record.title,
                    record.source_name,
                    record.criticality_score,
                    record.categories
                );
            }
            Err(e) => {
                log::error!("Failed to store {}: {}", record.source_url, e);
                outcome.status = ItemStatus::Failed(e.to_string());
            }
        }
        outcome
    }
}

#[async_trait]
impl CollectionJob for Collector {
    async fn run_cycle(&self) -> Result<CycleReport> {
        Ok(self.collect().await)
    }
}
