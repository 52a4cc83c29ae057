// src/models/mod.rs

//! Domain models for the collector.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod content;
mod source;

// Re-export all public types
pub use config::{
    AcquisitionConfig, Config, LoggingConfig, SchedulerConfig, StorageConfig, parse_duration,
};
pub use content::{CandidateRecord, Category, ContentItem};
pub use source::{ScrapedItem, Source};
