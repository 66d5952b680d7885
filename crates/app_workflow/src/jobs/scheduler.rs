//! Daily job scheduling
//!
//! Each scheduled job gets its own task that sleeps until the next run
//! time, fires the job through its [`JobRunner`] and goes back to sleep.
//! A runner lets at most one run of its job be in flight; a trigger that
//! arrives while the previous run is still going is skipped. On shutdown a
//! loop waits for its in-flight runs before it exits.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use core_kernel::Clock;

use super::{JobReport, MaintenanceJob};

/// Runs once a day at a fixed UTC time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// First run time strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

/// Guards a job against overlapping runs
pub struct JobRunner {
    job: Arc<dyn MaintenanceJob>,
    in_flight: Mutex<()>,
}

impl JobRunner {
    pub fn new(job: Arc<dyn MaintenanceJob>) -> Self {
        Self {
            job,
            in_flight: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.job.name()
    }

    /// Runs the job unless a run is already in flight
    ///
    /// Returns `None` when the trigger was skipped.
    pub async fn trigger(&self) -> Option<JobReport> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!(job = self.name(), "previous run still in progress, skipping trigger");
            return None;
        };

        let started = Instant::now();
        tracing::info!(job = self.name(), "maintenance job started");
        let report = self.job.run().await;
        tracing::info!(
            job = self.name(),
            examined = report.examined,
            processed = report.processed,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "maintenance job finished"
        );
        Some(report)
    }
}

/// Owns the schedules and spawns one loop per job
pub struct JobScheduler {
    clock: Arc<dyn Clock>,
    entries: Vec<(DailySchedule, Arc<JobRunner>)>,
}

impl JobScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Vec::new(),
        }
    }

    pub fn schedule(mut self, schedule: DailySchedule, job: Arc<dyn MaintenanceJob>) -> Self {
        self.entries.push((schedule, Arc::new(JobRunner::new(job))));
        self
    }

    pub fn runners(&self) -> impl Iterator<Item = &Arc<JobRunner>> {
        self.entries.iter().map(|(_, runner)| runner)
    }

    /// Starts every job loop; they stop once `shutdown` turns true or its
    /// sender is dropped, after any run already started has finished
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.entries
            .into_iter()
            .map(|(schedule, runner)| {
                let clock = self.clock.clone();
                let mut shutdown = shutdown.clone();
                tokio::spawn(async move {
                    let mut runs: Vec<JoinHandle<Option<JobReport>>> = Vec::new();
                    loop {
                        let now = clock.now();
                        let next = schedule.next_after(now);
                        let wait = (next - now).to_std().unwrap_or_default();
                        tracing::debug!(job = runner.name(), next_run = %next, "job scheduled");

                        tokio::select! {
                            _ = tokio::time::sleep(wait) => {
                                runs.retain(|run| !run.is_finished());
                                let runner = runner.clone();
                                runs.push(tokio::spawn(async move { runner.trigger().await }));
                            }
                            changed = shutdown.changed() => {
                                if changed.is_err() || *shutdown.borrow() {
                                    if !runs.is_empty() {
                                        tracing::info!(job = runner.name(), in_flight = runs.len(), "waiting for running job");
                                    }
                                    for run in runs.drain(..) {
                                        if let Err(e) = run.await {
                                            tracing::error!(job = runner.name(), error = %e, "job run aborted");
                                        }
                                    }
                                    tracing::info!(job = runner.name(), "job loop stopped");
                                    break;
                                }
                            }
                        }
                    }
                })
            })
            .collect()
    }
}
