// src/pipeline/scheduler.rs

//! Periodic driver for collection cycles.
//!
//! The first cycle runs as soon as the scheduler starts; later cycles follow
//! on a fixed interval. Stopping (explicitly or through the shared shutdown
//! token) is only observed between cycles, so a cycle that has begun always
//! runs to completion.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::pipeline::{CollectionJob, CycleReport};

/// Lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed(String),
}

/// Timing and result of one finished cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    /// 1-based cycle number since start
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: CycleOutcome,
}

pub struct Scheduler {
    job: Arc<dyn CollectionJob>,
    interval: Duration,
    state: Arc<watch::Sender<SchedulerState>>,
    records: Arc<watch::Sender<Option<CycleRecord>>>,
    stop: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(job: Arc<dyn CollectionJob>, interval: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        let (records, _) = watch::channel(None);
        Self {
            job,
            interval,
            state: Arc::new(state),
            records: Arc::new(records),
            stop: None,
            handle: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Receiver of the most recent cycle record.
    pub fn subscribe(&self) -> watch::Receiver<Option<CycleRecord>> {
        self.records.subscribe()
    }

    /// Spawn the run loop. Cancelling `shutdown` ends the loop after the
    /// current cycle, same as [`Scheduler::stop`].
    pub fn start(&mut self, shutdown: &CancellationToken) -> Result<()> {
        if self.state() != SchedulerState::Idle {
            return Err(AppError::validation("scheduler was already started"));
        }
        if self.interval.is_zero() {
            return Err(AppError::config("collection interval must be positive"));
        }

        let stop = shutdown.child_token();
        let run = RunLoop {
            job: Arc::clone(&self.job),
            interval: self.interval,
            stop: stop.clone(),
            state: Arc::clone(&self.state),
            records: Arc::clone(&self.records),
        };

        self.state.send_replace(SchedulerState::Running);
        log::info!("Scheduler started, interval {:?}", self.interval);
        self.handle = Some(tokio::spawn(run.run()));
        self.stop = Some(stop);
        Ok(())
    }

    /// Request a stop and wait until the run loop has exited, including any
    /// cycle still in flight. Calling it again is a no-op.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            if self.state() == SchedulerState::Idle {
                self.state.send_replace(SchedulerState::Stopped);
            }
            return;
        };

        if self.state() == SchedulerState::Running {
            self.state.send_replace(SchedulerState::Stopping);
        }
        if let Some(stop) = self.stop.take() {
            stop.cancel();
        }

        if let Err(e) = handle.await {
            log::error!("Scheduler loop ended abnormally: {}", e);
        }
        self.state.send_replace(SchedulerState::Stopped);
        log::info!("Scheduler stopped");
    }
}

struct RunLoop {
    job: Arc<dyn CollectionJob>,
    interval: Duration,
    stop: CancellationToken,
    state: Arc<watch::Sender<SchedulerState>>,
    records: Arc<watch::Sender<Option<CycleRecord>>>,
}

impl RunLoop {
    async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut sequence = 1;
        self.cycle(sequence).await;

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = ticker.tick() => {
                    sequence += 1;
                    self.cycle(sequence).await;
                }
            }
        }

        self.state.send_if_modified(|state| {
            if *state == SchedulerState::Running {
                *state = SchedulerState::Stopping;
                true
            } else {
                false
            }
        });
        log::debug!("Scheduler loop exited after {} cycles", sequence);
    }

    async fn cycle(&self, sequence: u64) {
        let started_at = Utc::now();
        let clock = Instant::now();

        let outcome = match self.job.run_cycle().await {
            Ok(report) => CycleOutcome::Completed(report),
            Err(e) => {
                log::error!("Cycle {} failed: {}", sequence, e);
                CycleOutcome::Failed(e.to_string())
            }
        };

        let duration = clock.elapsed();
        log::info!("Cycle {} took {:.1?}", sequence, duration);
        self.records.send_replace(Some(CycleRecord {
            sequence,
            started_at,
            duration,
            outcome,
        }));
    }
}
