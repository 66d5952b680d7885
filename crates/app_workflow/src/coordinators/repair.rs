//! Repair order coordinator

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use core_kernel::references::REPAIR_ORDER_PREFIX;
use core_kernel::{CacheHint, CacheScope, ClaimId, CustomerId, Money, RepairOrderId, Versioned};
use domain_claims::{ClaimError, NewRepairOrder, RepairOrder, RepairOrderUpdate, RepairStatus};

use super::plan::records;
use super::WorkflowContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::ports::{ChangeSet, RepairOrderQuery};

fn repair_hints(order: &RepairOrder) -> Vec<CacheHint> {
    vec![
        CacheHint::entry(CacheScope::RepairOrder, order.id),
        CacheHint::all(CacheScope::RepairOrders),
        CacheHint::entry(CacheScope::ClaimRepairOrder, order.claim_id),
        CacheHint::all(CacheScope::CustomerRepairOrders),
    ]
}

#[derive(Clone)]
pub struct RepairOrderCoordinator {
    ctx: Arc<WorkflowContext>,
}

impl RepairOrderCoordinator {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    /// Opens the repair order of a claim
    ///
    /// # Errors
    ///
    /// * `NotFound` - the claim does not exist
    /// * `Conflict` - the claim already has an order, or the number is taken
    /// * `Validation` - blank provider or description, bad contact e-mail,
    ///   estimate not in the future, negative estimated cost
    pub async fn create(&self, request: NewRepairOrder) -> WorkflowResult<Versioned<RepairOrder>> {
        let claim = self.ctx.store().claim(request.claim_id).await?;
        if let Some(existing) = self.ctx.store().repair_order_for_claim(claim.record.id).await? {
            return Err(WorkflowError::conflict(format!(
                "claim {} already has repair order {}",
                claim.record.claim_number, existing.record.order_number
            )));
        }

        let store = self.ctx.store().clone();
        let number = self
            .ctx
            .unique_reference(REPAIR_ORDER_PREFIX, request.order_number.clone(), |candidate| {
                let store = store.clone();
                async move {
                    store
                        .repair_order_by_number(&candidate)
                        .await
                        .map(|found| found.is_some())
                        .map_err(WorkflowError::from)
                }
            })
            .await?;

        let order = RepairOrder::open(RepairOrderId::new(), number, request, self.ctx.now())?;
        let hints = repair_hints(&order);
        self.ctx
            .commit(ChangeSet::new().insert(order.clone()), hints)
            .await?;

        tracing::info!(
            repair_order_id = %order.id,
            order_number = %order.order_number,
            claim_id = %order.claim_id,
            provider = %order.provider_name,
            "repair order opened"
        );
        Ok(Versioned::new(order, 1))
    }

    /// Validated status change; entering COMPLETED stamps the completion time
    pub async fn transition(&self, id: RepairOrderId, status: RepairStatus) -> WorkflowResult<Versioned<RepairOrder>> {
        self.mutate(id, |order, now| order.update_status(status, now))
            .await
    }

    /// IN_PROGRESS -> COMPLETED with the final cost and replaced parts
    pub async fn complete(
        &self,
        id: RepairOrderId,
        final_cost: Money,
        parts_replaced: Option<String>,
    ) -> WorkflowResult<Versioned<RepairOrder>> {
        self.mutate(id, |order, now| order.complete(final_cost, parts_replaced, now))
            .await
    }

    pub async fn cancel(&self, id: RepairOrderId, reason: Option<String>) -> WorkflowResult<Versioned<RepairOrder>> {
        self.mutate(id, |order, now| order.cancel(reason.as_deref(), now))
            .await
    }

    pub async fn update_details(
        &self,
        id: RepairOrderId,
        update: RepairOrderUpdate,
    ) -> WorkflowResult<Versioned<RepairOrder>> {
        self.mutate(id, |order, now| order.apply_details(update, now))
            .await
    }

    pub async fn assign_technician(&self, id: RepairOrderId, notes: String) -> WorkflowResult<Versioned<RepairOrder>> {
        self.mutate(id, |order, now| order.assign_technician(notes, now))
            .await
    }

    /// Removes an order on which no work has started
    pub async fn delete(&self, id: RepairOrderId) -> WorkflowResult<()> {
        let current = self.ctx.store().repair_order(id).await?;
        if !current.record.is_deletable() {
            return Err(WorkflowError::validation(format!(
                "repair order {} in status {} cannot be deleted",
                current.record.order_number, current.record.status
            )));
        }
        let hints = repair_hints(&current.record);
        self.ctx
            .commit(ChangeSet::new().delete_repair_order(id, current.version), hints)
            .await?;
        tracing::info!(repair_order_id = %id, "repair order deleted");
        Ok(())
    }

    pub async fn get(&self, id: RepairOrderId) -> WorkflowResult<Versioned<RepairOrder>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::RepairOrder, &id.to_string(), || async move {
                store.repair_order(id).await.map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_number(&self, order_number: &str) -> WorkflowResult<Versioned<RepairOrder>> {
        self.ctx
            .store()
            .repair_order_by_number(order_number)
            .await?
            .ok_or_else(|| WorkflowError::not_found("RepairOrder", order_number))
    }

    /// The claim's order, if any
    pub async fn for_claim(&self, claim_id: ClaimId) -> WorkflowResult<Option<RepairOrder>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::ClaimRepairOrder, &claim_id.to_string(), || async move {
                store
                    .repair_order_for_claim(claim_id)
                    .await
                    .map(|found| found.map(Versioned::into_inner))
                    .map_err(WorkflowError::from)
            })
            .await
    }

    /// Every repair order, oldest first
    pub async fn all(&self) -> WorkflowResult<Vec<RepairOrder>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::RepairOrders, "all", || async move {
                store
                    .find_repair_orders(&RepairOrderQuery::default())
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_status(&self, status: RepairStatus) -> WorkflowResult<Vec<RepairOrder>> {
        self.find(RepairOrderQuery::by_status(status)).await
    }

    /// Orders whose provider name contains `provider`, ignoring case
    pub async fn by_provider(&self, provider: &str) -> WorkflowResult<Vec<RepairOrder>> {
        self.find(RepairOrderQuery::by_provider(provider)).await
    }

    pub async fn for_customer(&self, customer_id: CustomerId) -> WorkflowResult<Vec<RepairOrder>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::CustomerRepairOrders, &customer_id.to_string(), || async move {
                store
                    .find_repair_orders(&RepairOrderQuery::for_customer(customer_id))
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    /// Open orders past their estimated completion
    pub async fn overdue(&self) -> WorkflowResult<Vec<RepairOrder>> {
        self.overdue_at(self.ctx.now()).await
    }

    pub(crate) async fn overdue_at(&self, at: DateTime<Utc>) -> WorkflowResult<Vec<RepairOrder>> {
        self.find(RepairOrderQuery::overdue_at(at)).await
    }

    pub async fn is_overdue(&self, id: RepairOrderId) -> WorkflowResult<bool> {
        let current = self.ctx.store().repair_order(id).await?;
        Ok(current.record.is_overdue(self.ctx.now()))
    }

    pub async fn count_by_status(&self) -> WorkflowResult<BTreeMap<RepairStatus, u64>> {
        let mut counts = BTreeMap::new();
        for order in self.find(RepairOrderQuery::default()).await? {
            *counts.entry(order.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Mean final cost of the provider's COMPLETED orders; zero when none
    pub async fn average_cost_by_provider(&self, provider: &str) -> WorkflowResult<Money> {
        let query = RepairOrderQuery::by_provider(provider).with_status(RepairStatus::Completed);
        let costs: Vec<Money> = self
            .find(query)
            .await?
            .into_iter()
            .filter_map(|order| order.repair_cost)
            .collect();

        let total: Money = costs.iter().sum();
        Ok(total
            .divide(Decimal::from(costs.len() as u64))
            .map(|average| average.rounded())
            .unwrap_or_else(|_| Money::zero()))
    }

    /// Completed orders untouched for longer than the follow-up period
    pub async fn needing_follow_up(&self) -> WorkflowResult<Vec<RepairOrder>> {
        let now = self.ctx.now();
        let after = self.ctx.config().follow_up_after();
        let completed = self.find(RepairOrderQuery::by_status(RepairStatus::Completed)).await?;
        Ok(completed
            .into_iter()
            .filter(|order| order.needs_follow_up(now, after))
            .collect())
    }

    async fn find(&self, query: RepairOrderQuery) -> WorkflowResult<Vec<RepairOrder>> {
        Ok(records(self.ctx.store().find_repair_orders(&query).await?))
    }

    async fn mutate<F>(&self, id: RepairOrderId, apply: F) -> WorkflowResult<Versioned<RepairOrder>>
    where
        F: FnOnce(&mut RepairOrder, DateTime<Utc>) -> Result<(), ClaimError>,
    {
        let mut current = self.ctx.store().repair_order(id).await?;
        let before = current.record.status;
        apply(&mut current.record, self.ctx.now())?;

        let updated = Versioned::new(current.record.clone(), current.version + 1);
        let hints = repair_hints(&current.record);
        self.ctx.commit(ChangeSet::new().update(current), hints).await?;

        if before != updated.record.status {
            tracing::info!(repair_order_id = %id, from = %before, to = %updated.record.status, "repair order status changed");
        }
        Ok(updated)
    }
}
