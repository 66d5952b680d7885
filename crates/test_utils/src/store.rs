//! Fault-injecting store wrapper
//!
//! Delegates to an [`InMemoryWorkflowStore`] but fails any commit that
//! writes one of the payments marked with [`FaultInjectingStore::fail_payment`].
//! Used to check that one bad record does not stop a batch or a job.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use app_workflow::ports::{Change, ChangeSet, ClaimQuery, PaymentQuery, PlanQuery, RepairOrderQuery, WorkflowStore};
use app_workflow::InMemoryWorkflowStore;
use core_kernel::{
    AssessmentId, ClaimId, DomainPort, PaymentId, PlanId, PortError, RepairOrderId, Versioned,
};
use domain_billing::PaymentRecord;
use domain_claims::{Claim, RepairOrder, TechnicalAssessment};
use domain_plan::CoveragePlan;

#[derive(Debug, Default)]
pub struct FaultInjectingStore {
    inner: InMemoryWorkflowStore,
    failing_payments: Mutex<HashSet<PaymentId>>,
}

impl FaultInjectingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryWorkflowStore {
        &self.inner
    }

    /// Makes every later commit touching `id` fail with a connection error
    pub fn fail_payment(&self, id: PaymentId) {
        if let Ok(mut ids) = self.failing_payments.lock() {
            ids.insert(id);
        }
    }

    fn should_fail(&self, changes: &ChangeSet) -> Option<PaymentId> {
        let ids = self.failing_payments.lock().ok()?;
        changes.changes().iter().find_map(|change| {
            let id = match change {
                Change::Payment(write) => write.record().id,
                Change::DeletePayment { id, .. } => *id,
                _ => return None,
            };
            ids.contains(&id).then_some(id)
        })
    }
}

impl DomainPort for FaultInjectingStore {}

#[async_trait]
impl WorkflowStore for FaultInjectingStore {
    async fn plan(&self, id: PlanId) -> Result<Versioned<CoveragePlan>, PortError> {
        self.inner.plan(id).await
    }

    async fn claim(&self, id: ClaimId) -> Result<Versioned<Claim>, PortError> {
        self.inner.claim(id).await
    }

    async fn assessment(&self, id: AssessmentId) -> Result<Versioned<TechnicalAssessment>, PortError> {
        self.inner.assessment(id).await
    }

    async fn payment(&self, id: PaymentId) -> Result<Versioned<PaymentRecord>, PortError> {
        self.inner.payment(id).await
    }

    async fn repair_order(&self, id: RepairOrderId) -> Result<Versioned<RepairOrder>, PortError> {
        self.inner.repair_order(id).await
    }

    async fn claim_by_number(&self, claim_number: &str) -> Result<Option<Versioned<Claim>>, PortError> {
        self.inner.claim_by_number(claim_number).await
    }

    async fn payment_by_reference(&self, reference: &str) -> Result<Option<Versioned<PaymentRecord>>, PortError> {
        self.inner.payment_by_reference(reference).await
    }

    async fn payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Versioned<PaymentRecord>>, PortError> {
        self.inner.payment_by_transaction_id(transaction_id).await
    }

    async fn repair_order_by_number(&self, order_number: &str) -> Result<Option<Versioned<RepairOrder>>, PortError> {
        self.inner.repair_order_by_number(order_number).await
    }

    async fn repair_order_for_claim(&self, claim_id: ClaimId) -> Result<Option<Versioned<RepairOrder>>, PortError> {
        self.inner.repair_order_for_claim(claim_id).await
    }

    async fn find_plans(&self, query: &PlanQuery) -> Result<Vec<Versioned<CoveragePlan>>, PortError> {
        self.inner.find_plans(query).await
    }

    async fn find_claims(&self, query: &ClaimQuery) -> Result<Vec<Versioned<Claim>>, PortError> {
        self.inner.find_claims(query).await
    }

    async fn find_payments(&self, query: &PaymentQuery) -> Result<Vec<Versioned<PaymentRecord>>, PortError> {
        self.inner.find_payments(query).await
    }

    async fn find_repair_orders(&self, query: &RepairOrderQuery) -> Result<Vec<Versioned<RepairOrder>>, PortError> {
        self.inner.find_repair_orders(query).await
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), PortError> {
        if let Some(id) = self.should_fail(&changes) {
            return Err(PortError::connection(format!("injected failure for payment {}", id)));
        }
        self.inner.commit(changes).await
    }
}
