//! Scheduled maintenance jobs
//!
//! Jobs are plain async units of work reporting how many records they
//! looked at. Scheduling and overlap protection live in [`scheduler`].
//! A job never fails as a whole: per-record errors are logged and counted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod expiry;
pub mod overdue;
pub mod scheduler;

pub use expiry::PendingPaymentExpiryJob;
pub use overdue::{OverdueRepairOrderJob, OverdueSink, TracingOverdueSink};
pub use scheduler::{DailySchedule, JobRunner, JobScheduler};

/// Outcome of one job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobReport {
    /// Records selected by the job
    pub examined: usize,
    /// Records acted upon
    pub processed: usize,
    /// Records whose processing failed
    pub failed: usize,
}

#[async_trait]
pub trait MaintenanceJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self) -> JobReport;
}
