// src/lib.rs

//! Threat-intelligence collector library.
//!
//! Sources are fetched by strategy (page scrape, feed, forum deep-crawl),
//! triaged into scored and categorized records, deduplicated by URL and
//! stored. The [`pipeline::Scheduler`] repeats that cycle until stopped.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
