//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── content.json          # Collected items with their category ids
//! └── categories.json       # Known categories, seeded on first open
//! ```
//!
//! Inserts rewrite `content.json` atomically (write to temp, then rename)
//! while holding the store lock, and the in-memory view is only updated once
//! the file is in place. A failed write leaves both untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{CandidateRecord, Category, ContentItem};
use crate::pipeline::criticality::known_categories;
use crate::storage::ContentStore;
use crate::utils::retry::RetryPolicy;

const CONTENT_KEY: &str = "content.json";
const CATEGORIES_KEY: &str = "categories.json";

/// On-disk shape of `content.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFile {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total item count
    pub count: usize,
    /// The items, in insertion order
    pub items: Vec<ContentItem>,
}

impl ContentFile {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    items: Vec<ContentItem>,
    urls: HashSet<String>,
    categories: Vec<Category>,
    next_id: u64,
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    root_dir: PathBuf,
    state: Mutex<State>,
}

impl LocalStorage {
    /// Open (or initialize) a store rooted at the given directory.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        tokio::fs::create_dir_all(&root_dir).await?;

        let items = read_json::<ContentFile>(&root_dir.join(CONTENT_KEY))
            .await?
            .map(|file| file.items)
            .unwrap_or_default();

        let categories = match read_json::<Vec<Category>>(&root_dir.join(CATEGORIES_KEY)).await? {
            Some(categories) => categories,
            None => {
                let seeded = seed_categories();
                write_json(&root_dir.join(CATEGORIES_KEY), &seeded).await?;
                log::info!("Seeded {} categories in {}", seeded.len(), root_dir.display());
                seeded
            }
        };

        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let urls = items.iter().map(|i| i.source_url.clone()).collect();
        log::info!(
            "Opened store at {} ({} items, {} categories)",
            root_dir.display(),
            items.len(),
            categories.len()
        );

        Ok(Self {
            root_dir,
            state: Mutex::new(State {
                items,
                urls,
                categories,
                next_id,
            }),
        })
    }

    /// Open the store, retrying with linear backoff before giving up.
    pub async fn open_with_retry(root_dir: impl Into<PathBuf>, attempts: u32) -> Result<Self> {
        let root_dir = root_dir.into();
        let root = &root_dir;
        RetryPolicy::linear(attempts)
            .run("open content store", move || Self::open(root.clone()))
            .await
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Snapshot of stored items.
    pub async fn items(&self) -> Vec<ContentItem> {
        self.state.lock().await.items.clone()
    }

    /// Snapshot of known categories.
    pub async fn categories(&self) -> Vec<Category> {
        self.state.lock().await.categories.clone()
    }
}

#[async_trait]
impl ContentStore for LocalStorage {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        Ok(self.state.lock().await.urls.contains(url))
    }

    async fn insert(&self, candidate: &CandidateRecord) -> Result<ContentItem> {
        let mut state = self.state.lock().await;

        let mut category_ids = Vec::new();
        for name in &candidate.categories {
            match state.categories.iter().find(|c| &c.name == name) {
                Some(category) => {
                    if !category_ids.contains(&category.id) {
                        category_ids.push(category.id);
                    }
                }
                None => log::warn!("Category not found: {}", name),
            }
        }

        let item = ContentItem::from_candidate(state.next_id, candidate, category_ids, Utc::now());

        let mut items = state.items.clone();
        items.push(item.clone());
        let file = ContentFile::new(items);
        write_json(&self.root_dir.join(CONTENT_KEY), &file).await?;

        state.items = file.items;
        state.urls.insert(item.source_url.clone());
        state.next_id += 1;
        Ok(item)
    }

    async fn close(&self) -> Result<()> {
        let state = self.state.lock().await;
        log::info!(
            "Closing store at {} ({} items)",
            self.root_dir.display(),
            state.items.len()
        );
        Ok(())
    }
}

fn seed_categories() -> Vec<Category> {
    known_categories()
        .zip(1u64..)
        .map(|(name, id)| Category {
            id,
            name: name.to_string(),
        })
        .collect()
}

/// Write bytes atomically (write to temp, then rename).
async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &bytes).await
}

/// Read JSON, returning None if the file doesn't exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|e| {
            AppError::storage(format!("{} is corrupt: {}", path.display(), e))
        })?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}
