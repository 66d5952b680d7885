//! Process wiring
//!
//! Builds the workflow over the in-memory store and cache, and owns the
//! daily maintenance schedule.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use app_workflow::{
    DailySchedule, InMemoryCache, InMemoryWorkflowStore, JobScheduler, OverdueRepairOrderJob,
    PendingPaymentExpiryJob, TracingOverdueSink, Workflow, WorkflowContext,
};
use core_kernel::{Clock, HealthCheckResult, HealthCheckable, TimestampReferenceGenerator};

use crate::config::DaemonConfig;

pub struct Hub {
    config: DaemonConfig,
    store: Arc<InMemoryWorkflowStore>,
    clock: Arc<dyn Clock>,
    workflow: Workflow,
}

impl Hub {
    pub fn new(config: DaemonConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryWorkflowStore::new());
        let ctx = WorkflowContext::new(store.clone(), clock.clone())
            .with_cache(Arc::new(InMemoryCache::new()))
            .with_references(Arc::new(TimestampReferenceGenerator))
            .with_config(config.workflow.clone());

        Self {
            config,
            store,
            clock,
            workflow: Workflow::new(ctx),
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub async fn health(&self) -> HealthCheckResult {
        self.store.health_check().await
    }

    /// Pending-payment expiry and the overdue repair report, at their
    /// configured times
    pub fn scheduler(&self) -> JobScheduler {
        let settings = &self.config.workflow;
        JobScheduler::new(self.clock.clone())
            .schedule(
                DailySchedule::new(settings.payment_expiry_at),
                Arc::new(PendingPaymentExpiryJob::new(self.workflow.clone())),
            )
            .schedule(
                DailySchedule::new(settings.overdue_repairs_at),
                Arc::new(OverdueRepairOrderJob::new(
                    self.workflow.clone(),
                    Arc::new(TracingOverdueSink),
                )),
            )
    }

    /// Runs the job loops until `shutdown` completes, then waits for them
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let (stop, stopped) = watch::channel(false);
        let handles = self.scheduler().spawn(stopped);
        tracing::info!(jobs = handles.len(), "maintenance jobs scheduled");

        shutdown.await;
        if stop.send(true).is_err() {
            tracing::debug!("job loops already gone");
        }
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "job loop ended abnormally");
            }
        }
    }
}
