//! Maintenance job tests

use async_trait::async_trait;
use chrono::Duration;
use std::sync::{Arc, Mutex};

use app_workflow::{
    JobReport, JobRunner, MaintenanceJob, OverdueRepairOrderJob, OverdueSink, PendingPaymentExpiryJob,
};
use core_kernel::RepairOrderId;
use domain_billing::PaymentStatus;
use domain_claims::{RepairOrder, RepairStatus};
use test_utils::*;

#[derive(Default)]
struct CollectingSink {
    reported: Mutex<Vec<(RepairOrderId, Duration)>>,
}

impl CollectingSink {
    fn reported(&self) -> Vec<(RepairOrderId, Duration)> {
        self.reported.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OverdueSink for CollectingSink {
    async fn report(&self, order: &RepairOrder, overdue_by: Duration) {
        if let Ok(mut reported) = self.reported.lock() {
            reported.push((order.id, overdue_by));
        }
    }
}

// ============================================================================
// Pending Payment Expiry Tests
// ============================================================================

mod expiry_tests {
    use super::*;

    #[tokio::test]
    async fn test_only_stale_pending_payments_expire() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let stale = h.pending_payment(&plan, TemporalFixtures::hours_ago(25)).await;
        let fresh = h.pending_payment(&plan, TemporalFixtures::hours_ago(1)).await;

        let report = PendingPaymentExpiryJob::new(h.workflow.clone()).run().await;
        assert_eq!(
            report,
            JobReport {
                examined: 1,
                processed: 1,
                failed: 0
            }
        );

        assert_eq!(
            h.payments().get(stale.id).await.unwrap().record.status,
            PaymentStatus::Expired
        );
        assert_eq!(
            h.payments().get(fresh.id).await.unwrap().record.status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_settled_payments_are_not_selected() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let completed = h.completed_payment(&plan, TemporalFixtures::hours_ago(48)).await;
        let failed = h.pending_payment(&plan, TemporalFixtures::hours_ago(48)).await;
        h.payments().mark_failed(failed.id, "declined").await.unwrap();

        let report = PendingPaymentExpiryJob::new(h.workflow.clone()).run().await;
        assert_eq!(report.examined, 0);
        assert_eq!(
            h.payments().get(completed.id).await.unwrap().record.status,
            PaymentStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_run() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let broken = h.pending_payment(&plan, TemporalFixtures::hours_ago(30)).await;
        let healthy = h.pending_payment(&plan, TemporalFixtures::hours_ago(26)).await;
        h.store.fail_payment(broken.id);

        let report = PendingPaymentExpiryJob::new(h.workflow.clone()).run().await;
        assert_eq!(report.examined, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);

        assert_eq!(
            h.payments().get(broken.id).await.unwrap().record.status,
            PaymentStatus::Pending
        );
        assert_eq!(
            h.payments().get(healthy.id).await.unwrap().record.status,
            PaymentStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        h.pending_payment(&plan, TemporalFixtures::hours_ago(25)).await;
        let job = PendingPaymentExpiryJob::new(h.workflow.clone());

        assert_eq!(job.run().await.processed, 1);
        assert_eq!(job.run().await, JobReport::default());
    }

    #[tokio::test]
    async fn test_runner_triggers_job() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        h.pending_payment(&plan, TemporalFixtures::hours_ago(25)).await;

        let runner = JobRunner::new(Arc::new(PendingPaymentExpiryJob::new(h.workflow.clone())));
        assert_eq!(runner.name(), "pending-payment-expiry");
        let report = runner.trigger().await;
        assert_eq!(report.map(|r| r.processed), Some(1));
    }
}

// ============================================================================
// Overdue Repair Order Tests
// ============================================================================

mod overdue_tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_overdue_orders_without_changing_them() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let late_claim = h.submitted_claim(&plan).await;
        let done_claim = h.submitted_claim(&plan).await;
        let late = h.repair_order(&late_claim).await;
        let done = h.repair_in_progress(&done_claim).await;
        h.repairs()
            .transition(done.id, RepairStatus::Completed)
            .await
            .unwrap();

        h.advance(Duration::days(7));
        let sink = Arc::new(CollectingSink::default());
        let report = OverdueRepairOrderJob::new(h.workflow.clone(), sink.clone())
            .run()
            .await;

        assert_eq!(report.examined, 1);
        assert_eq!(report.processed, 1);
        let reported = sink.reported();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].0, late.id);
        assert_eq!(reported[0].1, Duration::days(2));

        let stored = h.repairs().get(late.id).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.record.status, RepairStatus::Pending);
    }

    #[tokio::test]
    async fn test_nothing_to_report() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.submitted_claim(&plan).await;
        h.repair_order(&claim).await;

        let sink = Arc::new(CollectingSink::default());
        let report = OverdueRepairOrderJob::new(h.workflow.clone(), sink.clone())
            .run()
            .await;
        assert_eq!(report, JobReport::default());
        assert!(sink.reported().is_empty());
    }
}
