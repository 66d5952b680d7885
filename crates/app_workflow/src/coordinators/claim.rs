//! Claim coordinator
//!
//! Claims are filed against ACTIVE plans only. A claim may get one technical
//! assessment, recorded together with the link on the claim.

use std::sync::Arc;

use core_kernel::references::CLAIM_PREFIX;
use core_kernel::{AssessmentId, CacheHint, CacheScope, ClaimId, CustomerId, Money, PlanId, Versioned};
use domain_claims::{Claim, ClaimError, ClaimStatus, NewAssessment, NewClaim, TechnicalAssessment};

use super::plan::records;
use super::WorkflowContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::ports::{ChangeSet, ClaimQuery};

fn claim_hints(claim: &Claim) -> Vec<CacheHint> {
    vec![
        CacheHint::entry(CacheScope::Claim, claim.id),
        CacheHint::all(CacheScope::Claims),
        CacheHint::entry(CacheScope::PlanClaims, claim.plan_id),
        CacheHint::all(CacheScope::CustomerClaims),
    ]
}

#[derive(Clone)]
pub struct ClaimCoordinator {
    ctx: Arc<WorkflowContext>,
}

impl ClaimCoordinator {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    /// Files a claim against an active plan
    ///
    /// # Errors
    ///
    /// * `NotFound` - the plan does not exist
    /// * `Validation` - the plan is not ACTIVE, or the request is invalid
    /// * `Conflict` - the supplied claim number is taken
    pub async fn create(&self, request: NewClaim) -> WorkflowResult<Versioned<Claim>> {
        let plan = self.ctx.store().plan(request.plan_id).await?;
        if !plan.record.is_active() {
            return Err(WorkflowError::validation(format!(
                "cannot file a claim against plan {} in status {}",
                plan.record.id, plan.record.status
            )));
        }

        let store = self.ctx.store().clone();
        let number = self
            .ctx
            .unique_reference(CLAIM_PREFIX, request.claim_number.clone(), |candidate| {
                let store = store.clone();
                async move {
                    store
                        .claim_by_number(&candidate)
                        .await
                        .map(|found| found.is_some())
                        .map_err(WorkflowError::from)
                }
            })
            .await?;

        let claim = Claim::submit(ClaimId::new(), number, request, self.ctx.now())?;
        let hints = claim_hints(&claim);
        self.ctx
            .commit(ChangeSet::new().insert(claim.clone()), hints)
            .await?;

        tracing::info!(claim_id = %claim.id, claim_number = %claim.claim_number, plan_id = %claim.plan_id, "claim submitted");
        Ok(Versioned::new(claim, 1))
    }

    pub async fn transition(&self, id: ClaimId, status: ClaimStatus) -> WorkflowResult<Versioned<Claim>> {
        self.mutate(id, |claim, now| claim.update_status(status, now))
            .await
    }

    /// UNDER_REVIEW -> APPROVED with the granted amount
    pub async fn approve(&self, id: ClaimId, approved_amount: Money) -> WorkflowResult<Versioned<Claim>> {
        self.mutate(id, |claim, now| claim.approve(approved_amount, now))
            .await
    }

    /// Records the assessment and links it to the claim in one commit
    pub async fn record_assessment(
        &self,
        claim_id: ClaimId,
        request: NewAssessment,
    ) -> WorkflowResult<(Versioned<Claim>, Versioned<TechnicalAssessment>)> {
        let now = self.ctx.now();
        let mut claim = self.ctx.store().claim(claim_id).await?;
        let assessment = TechnicalAssessment::record(AssessmentId::new(), claim_id, request, now)?;
        claim.record.attach_assessment(assessment.id, now)?;

        let updated = Versioned::new(claim.record.clone(), claim.version + 1);
        let mut hints = claim_hints(&claim.record);
        hints.push(CacheHint::entry(CacheScope::Assessment, claim_id));
        self.ctx
            .commit(ChangeSet::new().insert(assessment.clone()).update(claim), hints)
            .await?;

        tracing::info!(claim_id = %claim_id, assessment_id = %assessment.id, result = ?assessment.result, "technical assessment recorded");
        Ok((updated, Versioned::new(assessment, 1)))
    }

    pub async fn get(&self, id: ClaimId) -> WorkflowResult<Versioned<Claim>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Claim, &id.to_string(), || async move {
                store.claim(id).await.map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_number(&self, claim_number: &str) -> WorkflowResult<Versioned<Claim>> {
        self.ctx
            .store()
            .claim_by_number(claim_number)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Claim", claim_number))
    }

    pub async fn for_plan(&self, plan_id: PlanId) -> WorkflowResult<Vec<Claim>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::PlanClaims, &plan_id.to_string(), || async move {
                store
                    .find_claims(&ClaimQuery::for_plan(plan_id))
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn for_customer(&self, customer_id: CustomerId) -> WorkflowResult<Vec<Claim>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::CustomerClaims, &customer_id.to_string(), || async move {
                store
                    .find_claims(&ClaimQuery::for_customer(customer_id))
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    /// Every claim, oldest first
    pub async fn all(&self) -> WorkflowResult<Vec<Claim>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Claims, "all", || async move {
                store
                    .find_claims(&ClaimQuery::default())
                    .await
                    .map(records)
                    .map_err(WorkflowError::from)
            })
            .await
    }

    pub async fn by_status(&self, status: ClaimStatus) -> WorkflowResult<Vec<Claim>> {
        Ok(records(self.ctx.store().find_claims(&ClaimQuery::by_status(status)).await?))
    }

    /// The claim's assessment, if one was recorded
    pub async fn assessment(&self, claim_id: ClaimId) -> WorkflowResult<Option<TechnicalAssessment>> {
        let store = self.ctx.store().clone();
        self.ctx
            .cached(CacheScope::Assessment, &claim_id.to_string(), || async move {
                let claim = store.claim(claim_id).await?;
                let assessment = match claim.record.assessment_id {
                    Some(id) => Some(store.assessment(id).await?.into_inner()),
                    None => None,
                };
                Ok::<_, WorkflowError>(assessment)
            })
            .await
    }

    async fn mutate<F>(&self, id: ClaimId, apply: F) -> WorkflowResult<Versioned<Claim>>
    where
        F: FnOnce(&mut Claim, chrono::DateTime<chrono::Utc>) -> Result<(), ClaimError>,
    {
        let mut current = self.ctx.store().claim(id).await?;
        let before = current.record.status;
        apply(&mut current.record, self.ctx.now())?;

        let updated = Versioned::new(current.record.clone(), current.version + 1);
        let hints = claim_hints(&current.record);
        self.ctx.commit(ChangeSet::new().update(current), hints).await?;

        tracing::info!(claim_id = %id, from = %before, to = %updated.record.status, "claim status changed");
        Ok(updated)
    }
}
