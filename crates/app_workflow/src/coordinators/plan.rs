//! Coverage plan coordinator

use std::sync::Arc;

use core_kernel::{CacheHint, CacheScope, CustomerId, PlanId, Versioned};
use domain_plan::{CoveragePlan, NewCoveragePlan, PlanDetailsUpdate, PlanStatus};

use super::WorkflowContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::ports::{ChangeSet, PlanQuery};

/// Cache entries made stale by a write to `plan`
pub(crate) fn plan_hints(plan: &CoveragePlan) -> Vec<CacheHint> {
    vec![
        CacheHint::entry(CacheScope::Plan, plan.id),
        CacheHint::all(CacheScope::Plans),
        CacheHint::entry(CacheScope::CustomerPlans, plan.customer_id),
    ]
}

#[derive(Clone)]
pub struct PlanCoordinator {
    ctx: Arc<WorkflowContext>,
}

impl PlanCoordinator {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    /// Opens a plan, ACTIVE unless INACTIVE was requested
    pub async fn create(&self, request: NewCoveragePlan) -> WorkflowResult<Versioned<CoveragePlan>> {
        let plan = CoveragePlan::open(PlanId::new(), request, self.ctx.now())?;
        let hints = plan_hints(&plan);
        self.ctx
            .commit(ChangeSet::new().insert(plan.clone()), hints)
            .await?;

        tracing::info!(plan_id = %plan.id, customer_id = %plan.customer_id, status = %plan.status, "coverage plan created");
        Ok(Versioned::new(plan, 1))
    }

    pub async fn transition(&self, id: PlanId, status: PlanStatus) -> WorkflowResult<Versioned<CoveragePlan>> {
        self.mutate(id, |plan, now| plan.transition_to(status, now))
            .await
    }

    pub async fn update_details(
        &self,
        id: PlanId,
        update: PlanDetailsUpdate,
    ) -> WorkflowResult<Versioned<CoveragePlan>> {
        self.mutate(id, |plan, now| plan.apply_details(update, now))
            .await
    }

    /// ACTIVE -> CANCELLED
    pub async fn cancel(&self, id: PlanId) -> WorkflowResult<Versioned<CoveragePlan>> {
        self.mutate(id, |plan, now| plan.cancel(now)).await
    }

    /// Extends the window by `months` and puts the plan back in force
    pub async fn renew(&self, id: PlanId, months: u32) -> WorkflowResult<Versioned<CoveragePlan>> {
        self.mutate(id, |plan, now| plan.renew(months, now)).await
    }

    pub async fn get(&self, id: PlanId) -> WorkflowResult<Versioned<CoveragePlan>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Plan, &id.to_string(), || async move {
                store.plan(id).await.map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn for_customer(&self, customer_id: CustomerId) -> WorkflowResult<Vec<CoveragePlan>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::CustomerPlans, &customer_id.to_string(), || async move {
                store
                    .find_plans(&PlanQuery::for_customer(customer_id))
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn active_for_customer(&self, customer_id: CustomerId) -> WorkflowResult<Vec<CoveragePlan>> {
        let query = PlanQuery::for_customer(customer_id).with_status(PlanStatus::Active);
        Ok(records(self.ctx.store().find_plans(&query).await?))
    }

    /// ACTIVE plans whose window has already ended
    pub async fn expired_as_of_now(&self) -> WorkflowResult<Vec<CoveragePlan>> {
        let query = PlanQuery::by_status(PlanStatus::Active).ending_before(self.ctx.now());
        Ok(records(self.ctx.store().find_plans(&query).await?))
    }

    /// Every plan, oldest first
    pub async fn all(&self) -> WorkflowResult<Vec<CoveragePlan>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Plans, "all", || async move {
                store
                    .find_plans(&PlanQuery::default())
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_status(&self, status: PlanStatus) -> WorkflowResult<Vec<CoveragePlan>> {
        Ok(records(self.ctx.store().find_plans(&PlanQuery::by_status(status)).await?))
    }

    async fn mutate<F>(&self, id: PlanId, apply: F) -> WorkflowResult<Versioned<CoveragePlan>>
    where
        F: FnOnce(&mut CoveragePlan, chrono::DateTime<chrono::Utc>) -> Result<(), domain_plan::PlanError>,
    {
        let mut current = self.ctx.store().plan(id).await?;
        let before = current.record.status;
        apply(&mut current.record, self.ctx.now())?;

        let updated = Versioned::new(current.record.clone(), current.version + 1);
        let hints = plan_hints(&current.record);
        self.ctx.commit(ChangeSet::new().update(current), hints).await?;

        if before != updated.record.status {
            tracing::info!(plan_id = %id, from = %before, to = %updated.record.status, "plan status changed");
        }
        Ok(updated)
    }
}

pub(crate) fn records<T>(rows: Vec<Versioned<T>>) -> Vec<T> {
    rows.into_iter().map(Versioned::into_inner).collect()
}
