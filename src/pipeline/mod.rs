//! Triage and collection pipeline.
//!
//! - `process`: Title, categories and criticality for a scraped item
//! - `collect`: One pass over every configured source
//! - `scheduler`: Repeats collection cycles until stopped

pub mod collect;
pub mod criticality;
pub mod process;
pub mod scheduler;
pub mod title;

pub use collect::{CollectionJob, Collector, CycleReport, ItemOutcome, ItemStatus};
pub use process::ContentProcessor;
pub use scheduler::{CycleOutcome, CycleRecord, Scheduler, SchedulerState};
