//! Workflow Test Harness
//!
//! Wires a [`Workflow`] over a fault-injecting in-memory store, a recording
//! cache and a fixed clock set to [`TemporalFixtures::now`]. Helpers create
//! records in common states through the coordinators, or write them to the
//! store directly when the state cannot be reached through the public
//! lifecycle.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use app_workflow::ports::{ChangeSet, WorkflowStore};
use app_workflow::{
    ClaimCoordinator, PaymentCoordinator, PlanCoordinator, RepairOrderCoordinator, Workflow,
    WorkflowConfig, WorkflowContext,
};
use core_kernel::{Clock, FixedClock, PaymentId, PlanId};
use domain_billing::{PaymentRecord, PaymentStatus};
use domain_claims::{Claim, ClaimStatus, RepairOrder, RepairStatus};
use domain_plan::{CoveragePlan, PlanStatus};

use crate::builders::{
    TestClaimRequestBuilder, TestPaymentRequestBuilder, TestPlanRequestBuilder,
    TestRepairOrderRequestBuilder,
};
use crate::cache::RecordingCache;
use crate::fixtures::TemporalFixtures;
use crate::store::FaultInjectingStore;

pub struct TestHarness {
    pub store: Arc<FaultInjectingStore>,
    pub cache: Arc<RecordingCache>,
    pub clock: Arc<FixedClock>,
    pub workflow: Workflow,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(WorkflowConfig::default())
    }

    pub fn with_config(config: WorkflowConfig) -> Self {
        let store = Arc::new(FaultInjectingStore::new());
        let cache = Arc::new(RecordingCache::new());
        let clock = Arc::new(FixedClock::new(TemporalFixtures::now()));

        let ctx = WorkflowContext::new(store.clone(), clock.clone())
            .with_cache(cache.clone())
            .with_config(config);

        Self {
            store,
            cache,
            clock,
            workflow: Workflow::new(ctx),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn plans(&self) -> PlanCoordinator {
        self.workflow.plans()
    }

    pub fn claims(&self) -> ClaimCoordinator {
        self.workflow.claims()
    }

    pub fn payments(&self) -> PaymentCoordinator {
        self.workflow.payments()
    }

    pub fn repairs(&self) -> RepairOrderCoordinator {
        self.workflow.repairs()
    }

    // ------------------------------------------------------------------
    // Seeding helpers
    // ------------------------------------------------------------------

    /// A one-year ACTIVE plan created through the coordinator
    pub async fn active_plan(&self) -> CoveragePlan {
        self.plans()
            .create(TestPlanRequestBuilder::new().build())
            .await
            .expect("create active plan")
            .into_inner()
    }

    /// A plan forced into `status`, bypassing the transition table
    pub async fn plan_in_status(&self, status: PlanStatus) -> CoveragePlan {
        let plan = self.active_plan().await;
        self.force_plan_status(plan.id, status).await
    }

    /// Overwrites a plan's status in the store
    pub async fn force_plan_status(&self, id: PlanId, status: PlanStatus) -> CoveragePlan {
        let mut current = self.store.plan(id).await.expect("load plan");
        current.record.status = status;
        let plan = current.record.clone();
        self.store
            .commit(ChangeSet::new().update(current))
            .await
            .expect("force plan status");
        plan
    }

    /// A PENDING payment of the plan premium dated `paid_at`
    pub async fn pending_payment(&self, plan: &CoveragePlan, paid_at: DateTime<Utc>) -> PaymentRecord {
        self.payments()
            .create(
                TestPaymentRequestBuilder::new(plan.id)
                    .with_amount(plan.premium)
                    .paid_at(paid_at)
                    .build(),
            )
            .await
            .expect("create pending payment")
            .into_inner()
    }

    /// A COMPLETED payment dated `paid_at`, completed through the coordinator
    pub async fn completed_payment(&self, plan: &CoveragePlan, paid_at: DateTime<Utc>) -> PaymentRecord {
        let pending = self.pending_payment(plan, paid_at).await;
        self.payments()
            .mark_completed(pending.id, format!("TX-{}", pending.id))
            .await
            .expect("complete payment")
            .into_inner()
    }

    /// Overwrites a payment's status in the store
    pub async fn force_payment_status(&self, id: PaymentId, status: PaymentStatus) -> PaymentRecord {
        let mut current = self.store.payment(id).await.expect("load payment");
        current.record.status = status;
        let payment = current.record.clone();
        self.store
            .commit(ChangeSet::new().update(current))
            .await
            .expect("force payment status");
        payment
    }

    /// A SUBMITTED claim against `plan`
    pub async fn submitted_claim(&self, plan: &CoveragePlan) -> Claim {
        self.claims()
            .create(TestClaimRequestBuilder::new(plan.id).build())
            .await
            .expect("submit claim")
            .into_inner()
    }

    /// A claim moved to UNDER_REVIEW
    pub async fn claim_under_review(&self, plan: &CoveragePlan) -> Claim {
        let claim = self.submitted_claim(plan).await;
        self.claims()
            .transition(claim.id, ClaimStatus::UnderReview)
            .await
            .expect("review claim")
            .into_inner()
    }

    /// A PENDING repair order for `claim`
    pub async fn repair_order(&self, claim: &Claim) -> RepairOrder {
        self.repairs()
            .create(TestRepairOrderRequestBuilder::new(claim.id).build())
            .await
            .expect("open repair order")
            .into_inner()
    }

    /// A repair order walked to IN_PROGRESS
    pub async fn repair_in_progress(&self, claim: &Claim) -> RepairOrder {
        let order = self.repair_order(claim).await;
        let repairs = self.repairs();
        repairs
            .transition(order.id, RepairStatus::Diagnosis)
            .await
            .expect("diagnose");
        repairs
            .transition(order.id, RepairStatus::InProgress)
            .await
            .expect("start repair")
            .into_inner()
    }
}
