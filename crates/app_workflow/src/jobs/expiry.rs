//! Pending payment expiry

use async_trait::async_trait;

use domain_billing::PaymentStatus;

use super::{JobReport, MaintenanceJob};
use crate::coordinators::{PaymentCoordinator, Workflow};
use crate::ports::PaymentQuery;

/// Moves PENDING payments older than the pending expiry to EXPIRED
///
/// Each payment is expired through [`PaymentCoordinator::expire`], which
/// re-checks staleness against the stored record, so a payment settled
/// between selection and update is left alone.
#[derive(Clone)]
pub struct PendingPaymentExpiryJob {
    workflow: Workflow,
}

impl PendingPaymentExpiryJob {
    pub fn new(workflow: Workflow) -> Self {
        Self { workflow }
    }

    fn payments(&self) -> PaymentCoordinator {
        self.workflow.payments()
    }
}

#[async_trait]
impl MaintenanceJob for PendingPaymentExpiryJob {
    fn name(&self) -> &'static str {
        "pending-payment-expiry"
    }

    async fn run(&self) -> JobReport {
        let ctx = self.workflow.context();
        let cutoff = ctx.policy().pending_cutoff(ctx.now());
        let query = PaymentQuery::by_status(PaymentStatus::Pending).paid_before(cutoff);

        let stale = match ctx.store().find_payments(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(job = self.name(), error = %e, "could not select stale payments");
                return JobReport::default();
            }
        };

        let payments = self.payments();
        let mut report = JobReport {
            examined: stale.len(),
            ..Default::default()
        };
        for row in stale {
            let payment = row.record;
            match payments.expire(payment.id).await {
                Ok(Some(_)) => report.processed += 1,
                Ok(None) => {
                    tracing::debug!(payment_id = %payment.id, "payment no longer stale, skipped");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        payment_id = %payment.id,
                        reference = %payment.payment_reference,
                        error = %e,
                        "failed to expire payment"
                    );
                }
            }
        }
        report
    }
}
