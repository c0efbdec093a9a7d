//! Periodic job picker.
//!
//! Wakes on a fixed interval (or a manual trigger), loads every PENDING job
//! oldest first and runs them one after another on the scheduler thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::db::{job_repo, Database, DatabaseError};
use crate::job::JobStatus;
use crate::pipeline::JobRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No pending jobs.
    Idle,
    Ran { succeeded: usize, failed: usize },
    /// A previous tick was still running.
    Skipped,
}

#[derive(Clone)]
pub struct Scheduler {
    runner: JobRunner,
    db: Database,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

/// Clears the run-in-progress flag when a tick ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Scheduler {
    pub fn new(runner: JobRunner, db: Database, interval: Duration) -> Self {
        Self {
            runner,
            db,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs every pending job once. Returns `Skipped` without touching the
    /// store if another tick is in flight.
    pub async fn tick(&self) -> Result<TickOutcome, DatabaseError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Previous run still in progress, skipping tick");
            return Ok(TickOutcome::Skipped);
        }
        let _guard = RunGuard(&self.running);

        let pending = job_repo::list_by_status(&self.db, JobStatus::Pending)?;
        if pending.is_empty() {
            log::debug!("No pending jobs");
            return Ok(TickOutcome::Idle);
        }

        log::info!("Found {} pending jobs", pending.len());
        let mut succeeded = 0;
        let mut failed = 0;
        for job in pending {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            let id = job.id.clone();
            match self.runner.run(job).await {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    log::error!("Job {} failed: {}", id, e);
                    failed += 1;
                }
            }
        }

        Ok(TickOutcome::Ran { succeeded, failed })
    }

    /// Starts the loop on a background thread. Each message on `trigger_rx`
    /// wakes it early.
    pub fn start(&self, mut trigger_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let scheduler = self.clone();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to start scheduler runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async {
                let mut interval_timer = tokio::time::interval(scheduler.interval);
                interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    if scheduler.shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    tokio::select! {
                        _ = interval_timer.tick() => {},
                        Ok(()) = trigger_rx.recv() => {
                            log::info!("Manual run triggered");
                        },
                    }

                    if scheduler.shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    match scheduler.tick().await {
                        Ok(TickOutcome::Ran { succeeded, failed }) => {
                            log::info!("Run finished: {} succeeded, {} failed", succeeded, failed);
                        }
                        Err(e) => log::error!("Failed to load pending jobs: {}", e),
                        _ => {}
                    }
                }
                log::info!("Scheduler stopped");
            });
        })
    }

    /// Signals the loop to exit at its next wake-up.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
