//! Overdue repair order detection

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use domain_claims::RepairOrder;

use super::{JobReport, MaintenanceJob};
use crate::coordinators::Workflow;

/// Receives each overdue order found by [`OverdueRepairOrderJob`]
#[async_trait]
pub trait OverdueSink: Send + Sync + 'static {
    async fn report(&self, order: &RepairOrder, overdue_by: Duration);
}

/// Reports overdue orders as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOverdueSink;

#[async_trait]
impl OverdueSink for TracingOverdueSink {
    async fn report(&self, order: &RepairOrder, overdue_by: Duration) {
        tracing::warn!(
            repair_order_id = %order.id,
            order_number = %order.order_number,
            provider = %order.provider_name,
            status = %order.status,
            overdue_hours = overdue_by.num_hours(),
            "repair order overdue"
        );
    }
}

/// Reports open repair orders past their estimated completion
///
/// Read-only: orders are never changed by this job.
#[derive(Clone)]
pub struct OverdueRepairOrderJob {
    workflow: Workflow,
    sink: Arc<dyn OverdueSink>,
}

impl OverdueRepairOrderJob {
    pub fn new(workflow: Workflow, sink: Arc<dyn OverdueSink>) -> Self {
        Self { workflow, sink }
    }
}

#[async_trait]
impl MaintenanceJob for OverdueRepairOrderJob {
    fn name(&self) -> &'static str {
        "overdue-repair-orders"
    }

    async fn run(&self) -> JobReport {
        let now = self.workflow.context().now();
        let overdue = match self.workflow.repairs().overdue_at(now).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(job = self.name(), error = %e, "could not select overdue repair orders");
                return JobReport::default();
            }
        };

        let mut report = JobReport {
            examined: overdue.len(),
            ..Default::default()
        };
        for order in &overdue {
            let overdue_by = order
                .estimated_completion
                .map(|eta| now - eta)
                .unwrap_or_else(Duration::zero);
            self.sink.report(order, overdue_by).await;
            report.processed += 1;
        }
        report
    }
}
