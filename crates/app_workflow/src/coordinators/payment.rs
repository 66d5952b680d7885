//! Payment coordinator
//!
//! Owns the payment lifecycle and the two payment-driven plan rules. A
//! completed or refunded payment is committed together with whatever the
//! rule did to its plan.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use core_kernel::references::PAYMENT_PREFIX;
use core_kernel::{CacheHint, CacheScope, CustomerId, Money, PaymentId, PlanId, Versioned};
use domain_billing::{
    count_by_status, revenue_by_method, NewPayment, PaymentDetailsUpdate,
    PaymentMethod, PaymentRecord, PaymentStatistics, PaymentStatus,
};
use domain_plan::PlanStatus;

use super::plan::{plan_hints, records};
use super::WorkflowContext;
use crate::consistency::{apply_completion_rule, apply_refund_rule, load_plan};
use crate::error::{WorkflowError, WorkflowResult};
use crate::ports::{ChangeSet, PaymentQuery};

fn payment_hints(payment: &PaymentRecord) -> Vec<CacheHint> {
    vec![
        CacheHint::entry(CacheScope::Payment, payment.id),
        CacheHint::all(CacheScope::Payments),
        CacheHint::entry(CacheScope::PlanPayments, payment.plan_id),
        CacheHint::all(CacheScope::CustomerPayments),
        CacheHint::all(CacheScope::PaymentStats),
    ]
}

/// Plan side effect of a payment status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanRule {
    Completion,
    Refund,
}

#[derive(Clone)]
pub struct PaymentCoordinator {
    ctx: Arc<WorkflowContext>,
}

impl PaymentCoordinator {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    /// Records a payment against a plan
    ///
    /// Missing reference, date and status are filled in as a generated
    /// `PAY-...` reference, the current time and PENDING.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the plan does not exist
    /// * `Validation` - non-positive amount, closed plan, amount outside the
    ///   premium tolerance (`AmountMismatch`), or a non-PENDING initial status
    /// * `Conflict` - the reference or transaction id is taken
    pub async fn create(&self, request: NewPayment) -> WorkflowResult<Versioned<PaymentRecord>> {
        if !request.amount.is_positive() {
            return Err(WorkflowError::validation("payment amount must be greater than zero"));
        }

        let plan = self.ctx.store().plan(request.plan_id).await?;
        if matches!(plan.record.status, PlanStatus::Cancelled | PlanStatus::Suspended) {
            return Err(WorkflowError::validation(format!(
                "cannot record a payment for plan {} in status {}",
                plan.record.id, plan.record.status
            )));
        }

        let policy = self.ctx.policy();
        policy.validate_amount(request.amount, plan.record.premium)?;
        let status = policy.initial_status(request.status)?;
        let now = self.ctx.now();
        let payment_date = request.payment_date.unwrap_or(now);

        if let Some(tx) = request.transaction_id.as_deref() {
            self.ensure_transaction_free(tx, None).await?;
        }

        let store = self.ctx.store().clone();
        let reference = self
            .ctx
            .unique_reference(PAYMENT_PREFIX, request.payment_reference.clone(), |candidate| {
                let store = store.clone();
                async move {
                    store
                        .payment_by_reference(&candidate)
                        .await
                        .map(|found| found.is_some())
                        .map_err(WorkflowError::from)
                }
            })
            .await?;

        let payment = PaymentRecord::record(PaymentId::new(), reference, request, payment_date, status, now)?;
        let hints = payment_hints(&payment);
        self.ctx
            .commit(ChangeSet::new().insert(payment.clone()), hints)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            reference = %payment.payment_reference,
            plan_id = %payment.plan_id,
            amount = %payment.amount,
            "payment recorded"
        );
        Ok(Versioned::new(payment, 1))
    }

    /// Records each payment on its own; one failure does not stop the rest
    pub async fn create_batch(
        &self,
        requests: Vec<NewPayment>,
    ) -> Vec<WorkflowResult<Versioned<PaymentRecord>>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.create(request).await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "payment in batch rejected");
            }
            results.push(result);
        }
        results
    }

    /// Generic status change; COMPLETED and REFUNDED apply the plan rules
    pub async fn transition(&self, id: PaymentId, status: PaymentStatus) -> WorkflowResult<Versioned<PaymentRecord>> {
        if status == PaymentStatus::Refunded {
            return self.refund(id).await;
        }

        let mut current = self.ctx.store().payment(id).await?;
        let before = current.record.status;
        current.record.update_status(status, self.ctx.now())?;

        if status == PaymentStatus::Completed {
            self.commit_with_rule(current, before, PlanRule::Completion).await
        } else {
            self.save(current, before).await
        }
    }

    /// PENDING -> COMPLETED with the processor's transaction id
    pub async fn mark_completed(&self, id: PaymentId, transaction_id: String) -> WorkflowResult<Versioned<PaymentRecord>> {
        self.ensure_transaction_free(&transaction_id, Some(id)).await?;

        let mut current = self.ctx.store().payment(id).await?;
        let before = current.record.status;
        current.record.mark_completed(transaction_id, self.ctx.now())?;
        self.commit_with_rule(current, before, PlanRule::Completion).await
    }

    /// PENDING -> FAILED, keeping the reason in the payment details
    pub async fn mark_failed(&self, id: PaymentId, reason: &str) -> WorkflowResult<Versioned<PaymentRecord>> {
        let mut current = self.ctx.store().payment(id).await?;
        let before = current.record.status;
        current.record.mark_failed(reason, self.ctx.now())?;
        self.save(current, before).await
    }

    /// Puts a FAILED payment back to PENDING; a PENDING one is returned as is
    pub async fn retry(&self, id: PaymentId) -> WorkflowResult<Versioned<PaymentRecord>> {
        let mut current = self.ctx.store().payment(id).await?;
        if !self.ctx.policy().can_retry(&current.record) {
            return Err(WorkflowError::validation(format!(
                "payment {} in status {} cannot be retried",
                current.record.payment_reference, current.record.status
            )));
        }
        if current.record.status == PaymentStatus::Pending {
            return Ok(current);
        }

        current.record.update_status(PaymentStatus::Pending, self.ctx.now())?;
        self.save(current, PaymentStatus::Failed).await
    }

    /// COMPLETED -> REFUNDED inside the refund window; suspends the plan
    pub async fn refund(&self, id: PaymentId) -> WorkflowResult<Versioned<PaymentRecord>> {
        let now = self.ctx.now();
        let mut current = self.ctx.store().payment(id).await?;
        self.ctx.policy().ensure_refundable(&current.record, now)?;
        current.record.update_status(PaymentStatus::Refunded, now)?;
        self.commit_with_rule(current, PaymentStatus::Completed, PlanRule::Refund).await
    }

    /// PENDING -> EXPIRED if the payment is still stale
    ///
    /// Returns `None` when the payment was settled or refreshed since it
    /// was selected.
    pub async fn expire(&self, id: PaymentId) -> WorkflowResult<Option<Versioned<PaymentRecord>>> {
        let now = self.ctx.now();
        let mut current = self.ctx.store().payment(id).await?;
        if !self.ctx.policy().is_stale_pending(&current.record, now) {
            return Ok(None);
        }
        current.record.update_status(PaymentStatus::Expired, now)?;
        self.save(current, PaymentStatus::Pending).await.map(Some)
    }

    pub async fn update_details(
        &self,
        id: PaymentId,
        update: PaymentDetailsUpdate,
    ) -> WorkflowResult<Versioned<PaymentRecord>> {
        if let Some(tx) = update.transaction_id.as_deref() {
            self.ensure_transaction_free(tx, Some(id)).await?;
        }
        let mut current = self.ctx.store().payment(id).await?;
        let status = current.record.status;
        current.record.apply_details(update, self.ctx.now())?;
        self.save(current, status).await
    }

    /// Removes an unsettled (PENDING or FAILED) payment
    pub async fn delete(&self, id: PaymentId) -> WorkflowResult<()> {
        let current = self.ctx.store().payment(id).await?;
        if !current.record.is_deletable() {
            return Err(WorkflowError::validation(format!(
                "payment {} in status {} cannot be deleted",
                current.record.payment_reference, current.record.status
            )));
        }
        let hints = payment_hints(&current.record);
        self.ctx
            .commit(ChangeSet::new().delete_payment(id, current.version), hints)
            .await?;
        tracing::info!(payment_id = %id, "payment deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn get(&self, id: PaymentId) -> WorkflowResult<Versioned<PaymentRecord>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Payment, &id.to_string(), || async move {
                store.payment(id).await.map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_reference(&self, reference: &str) -> WorkflowResult<Versioned<PaymentRecord>> {
        self.ctx
            .store()
            .payment_by_reference(reference)
            .await?
            .ok_or_else(|| WorkflowError::not_found("PaymentRecord", reference))
    }

    pub async fn by_transaction_id(&self, transaction_id: &str) -> WorkflowResult<Versioned<PaymentRecord>> {
        self.ctx
            .store()
            .payment_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("PaymentRecord", transaction_id))
    }

    pub async fn for_plan(&self, plan_id: PlanId) -> WorkflowResult<Vec<PaymentRecord>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::PlanPayments, &plan_id.to_string(), || async move {
                store
                    .find_payments(&PaymentQuery::for_plan(plan_id))
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn for_customer(&self, customer_id: CustomerId) -> WorkflowResult<Vec<PaymentRecord>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::CustomerPayments, &customer_id.to_string(), || async move {
                store
                    .find_payments(&PaymentQuery::for_customer(customer_id))
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    /// Every payment, by payment date
    pub async fn all(&self) -> WorkflowResult<Vec<PaymentRecord>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Payments, "all", || async move {
                store
                    .find_payments(&PaymentQuery::default())
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_status(&self, status: PaymentStatus) -> WorkflowResult<Vec<PaymentRecord>> {
        self.find(PaymentQuery::by_status(status)).await
    }

    pub async fn by_method(&self, method: PaymentMethod) -> WorkflowResult<Vec<PaymentRecord>> {
        self.find(PaymentQuery::by_method(method)).await
    }

    /// Payments dated within `[start, end]`
    pub async fn in_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> WorkflowResult<Vec<PaymentRecord>> {
        if start > end {
            return Err(WorkflowError::validation(format!(
                "range start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        self.find(PaymentQuery::between(start, end)).await
    }

    pub async fn is_refundable(&self, id: PaymentId) -> WorkflowResult<bool> {
        let current = self.ctx.store().payment(id).await?;
        Ok(self.ctx.policy().is_refundable(&current.record, self.ctx.now()))
    }

    pub async fn can_retry(&self, id: PaymentId) -> WorkflowResult<bool> {
        let current = self.ctx.store().payment(id).await?;
        Ok(self.ctx.policy().can_retry(&current.record))
    }

    /// Sum of the customer's COMPLETED payments
    pub async fn total_paid_by_customer(&self, customer_id: CustomerId) -> WorkflowResult<Money> {
        let query = PaymentQuery::for_customer(customer_id).with_status(PaymentStatus::Completed);
        Ok(self.find(query).await?.iter().map(|p| p.amount).sum())
    }

    pub async fn statistics_for_customer(&self, customer_id: CustomerId) -> WorkflowResult<PaymentStatistics> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::PaymentStats, &customer_id.to_string(), || async move {
                let rows = store.find_payments(&PaymentQuery::for_customer(customer_id)).await?;
                Ok::<_, WorkflowError>(PaymentStatistics::from_records(rows.iter().map(|r| &r.record)))
            })
            .await
    }

    pub async fn count_by_status(&self) -> WorkflowResult<BTreeMap<PaymentStatus, u64>> {
        let all = self.find(PaymentQuery::default()).await?;
        Ok(count_by_status(&all))
    }

    /// Completed revenue per payment method
    pub async fn revenue_by_method(&self) -> WorkflowResult<BTreeMap<PaymentMethod, Money>> {
        let completed = self.find(PaymentQuery::by_status(PaymentStatus::Completed)).await?;
        Ok(revenue_by_method(&completed))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn find(&self, query: PaymentQuery) -> WorkflowResult<Vec<PaymentRecord>> {
        Ok(records(self.ctx.store().find_payments(&query).await?))
    }

    /// Fails if another payment already carries `transaction_id`
    async fn ensure_transaction_free(&self, transaction_id: &str, owner: Option<PaymentId>) -> WorkflowResult<()> {
        match self.ctx.store().payment_by_transaction_id(transaction_id).await? {
            Some(existing) if Some(existing.record.id) != owner => Err(WorkflowError::conflict(format!(
                "transaction id {} already recorded on payment {}",
                transaction_id, existing.record.payment_reference
            ))),
            _ => Ok(()),
        }
    }

    async fn save(
        &self,
        current: Versioned<PaymentRecord>,
        from: PaymentStatus,
    ) -> WorkflowResult<Versioned<PaymentRecord>> {
        let updated = Versioned::new(current.record.clone(), current.version + 1);
        let hints = payment_hints(&current.record);
        self.ctx.commit(ChangeSet::new().update(current), hints).await?;
        log_transition(&updated.record, from);
        Ok(updated)
    }

    /// Commits the payment together with the plan change its rule produced
    async fn commit_with_rule(
        &self,
        payment: Versioned<PaymentRecord>,
        from: PaymentStatus,
        rule: PlanRule,
    ) -> WorkflowResult<Versioned<PaymentRecord>> {
        let now = self.ctx.now();
        let mut plan = load_plan(self.ctx.store().as_ref(), payment.record.plan_id).await?;
        let before = plan.record.status;
        let changed = match rule {
            PlanRule::Completion => {
                apply_completion_rule(&mut plan.record, self.ctx.config().billing_period_months, now)?
            }
            PlanRule::Refund => apply_refund_rule(&mut plan.record, now),
        };

        let updated = Versioned::new(payment.record.clone(), payment.version + 1);
        let mut hints = payment_hints(&payment.record);
        let mut changes = ChangeSet::new().update(payment);
        if changed {
            hints.extend(plan_hints(&plan.record));
            tracing::info!(
                plan_id = %plan.record.id,
                from = %before,
                to = %plan.record.status,
                rule = ?rule,
                "plan updated by payment rule"
            );
            changes = changes.update(plan);
        }

        self.ctx.commit(changes, hints).await?;
        log_transition(&updated.record, from);
        Ok(updated)
    }
}

fn log_transition(payment: &PaymentRecord, from: PaymentStatus) {
    if payment.status == from {
        return;
    }
    tracing::info!(
        payment_id = %payment.id,
        reference = %payment.payment_reference,
        from = %from,
        to = %payment.status,
        "payment status changed"
    );
}
