//! In-memory workflow store
//!
//! Tables live behind one `RwLock`, which serializes writers. A commit
//! applies its changes in place and records how to restore every row it
//! touched; if a later change fails, the touched rows are put back in
//! reverse order, so a commit is all-or-nothing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, AssessmentId, ClaimId, DomainPort, HealthCheckResult, HealthCheckable,
    PaymentId, PlanId, PortError, RepairOrderId, Versioned,
};
use domain_billing::PaymentRecord;
use domain_claims::{Claim, RepairOrder, TechnicalAssessment};
use domain_plan::CoveragePlan;

use crate::ports::{
    Change, ChangeSet, ClaimQuery, PaymentQuery, PlanQuery, RepairOrderQuery, WorkflowStore, Write,
};

#[derive(Debug, Default)]
struct Tables {
    plans: HashMap<PlanId, Versioned<CoveragePlan>>,
    claims: HashMap<ClaimId, Versioned<Claim>>,
    assessments: HashMap<AssessmentId, Versioned<TechnicalAssessment>>,
    payments: HashMap<PaymentId, Versioned<PaymentRecord>>,
    repair_orders: HashMap<RepairOrderId, Versioned<RepairOrder>>,
}

/// Puts one row back the way it was before a change
type Restore = Box<dyn FnOnce(&mut Tables) + Send>;

/// A record kind the store keeps in its own table
trait Row: Clone + Sized + Send + 'static {
    type Id: Copy + Eq + Hash + fmt::Display + Send + 'static;
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;
    fn table(tables: &mut Tables) -> &mut HashMap<Self::Id, Versioned<Self>>;
    /// (key name, value) pairs that must be unique across the table
    fn unique_keys(&self) -> Vec<(&'static str, String)>;
}

impl Row for CoveragePlan {
    type Id = PlanId;
    const ENTITY: &'static str = "CoveragePlan";

    fn id(&self) -> PlanId {
        self.id
    }
    fn table(tables: &mut Tables) -> &mut HashMap<PlanId, Versioned<Self>> {
        &mut tables.plans
    }
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl Row for Claim {
    type Id = ClaimId;
    const ENTITY: &'static str = "Claim";

    fn id(&self) -> ClaimId {
        self.id
    }
    fn table(tables: &mut Tables) -> &mut HashMap<ClaimId, Versioned<Self>> {
        &mut tables.claims
    }
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("claim_number", self.claim_number.clone())]
    }
}

impl Row for TechnicalAssessment {
    type Id = AssessmentId;
    const ENTITY: &'static str = "TechnicalAssessment";

    fn id(&self) -> AssessmentId {
        self.id
    }
    fn table(tables: &mut Tables) -> &mut HashMap<AssessmentId, Versioned<Self>> {
        &mut tables.assessments
    }
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("claim_id", self.claim_id.to_string())]
    }
}

impl Row for PaymentRecord {
    type Id = PaymentId;
    const ENTITY: &'static str = "PaymentRecord";

    fn id(&self) -> PaymentId {
        self.id
    }
    fn table(tables: &mut Tables) -> &mut HashMap<PaymentId, Versioned<Self>> {
        &mut tables.payments
    }
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        let mut keys = vec![("payment_reference", self.payment_reference.clone())];
        if let Some(tx) = &self.transaction_id {
            keys.push(("transaction_id", tx.clone()));
        }
        keys
    }
}

impl Row for RepairOrder {
    type Id = RepairOrderId;
    const ENTITY: &'static str = "RepairOrder";

    fn id(&self) -> RepairOrderId {
        self.id
    }
    fn table(tables: &mut Tables) -> &mut HashMap<RepairOrderId, Versioned<Self>> {
        &mut tables.repair_orders
    }
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("order_number", self.order_number.clone()),
            ("claim_id", self.claim_id.to_string()),
        ]
    }
}

fn restore<T: Row>(id: T::Id, prior: Option<Versioned<T>>) -> Restore {
    Box::new(move |tables: &mut Tables| {
        let table = T::table(tables);
        match prior {
            Some(row) => {
                table.insert(id, row);
            }
            None => {
                table.remove(&id);
            }
        }
    })
}

fn apply_write<T: Row>(tables: &mut Tables, write: Write<T>) -> Result<Restore, PortError> {
    let table = T::table(tables);
    let (record, version) = match write {
        Write::Insert(record) => {
            if table.contains_key(&record.id()) {
                return Err(PortError::duplicate(T::ENTITY, "id", record.id()));
            }
            (record, 1)
        }
        Write::Update { record, expected_version } => {
            let current = table
                .get(&record.id())
                .ok_or_else(|| PortError::not_found(T::ENTITY, record.id()))?;
            if current.version != expected_version {
                return Err(PortError::version_conflict(
                    T::ENTITY,
                    record.id(),
                    expected_version,
                    current.version,
                ));
            }
            (record, expected_version + 1)
        }
    };

    for (key, value) in record.unique_keys() {
        let taken = table.values().any(|other| {
            other.record.id() != record.id()
                && other
                    .record
                    .unique_keys()
                    .iter()
                    .any(|(k, v)| *k == key && *v == value)
        });
        if taken {
            return Err(PortError::duplicate(T::ENTITY, key, value));
        }
    }

    let id = record.id();
    let prior = table.insert(id, Versioned::new(record, version));
    Ok(restore(id, prior))
}

fn apply_delete<T: Row>(tables: &mut Tables, id: T::Id, expected_version: u64) -> Result<Restore, PortError> {
    let table = T::table(tables);
    let current = table
        .get(&id)
        .ok_or_else(|| PortError::not_found(T::ENTITY, id))?;
    if current.version != expected_version {
        return Err(PortError::version_conflict(
            T::ENTITY,
            id,
            expected_version,
            current.version,
        ));
    }
    let prior = table.remove(&id);
    Ok(restore(id, prior))
}

fn apply(tables: &mut Tables, change: Change) -> Result<Restore, PortError> {
    match change {
        Change::Plan(w) => apply_write(tables, w),
        Change::Claim(w) => apply_write(tables, w),
        Change::Assessment(w) => apply_write(tables, w),
        Change::Payment(w) => apply_write(tables, w),
        Change::RepairOrder(w) => apply_write(tables, w),
        Change::DeletePayment { id, expected_version } => {
            apply_delete::<PaymentRecord>(tables, id, expected_version)
        }
        Change::DeleteRepairOrder { id, expected_version } => {
            apply_delete::<RepairOrder>(tables, id, expected_version)
        }
    }
}

/// Sorted oldest first, ties broken by id
fn sorted<T, I: Ord>(
    mut rows: Vec<Versioned<T>>,
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, I),
) -> Vec<Versioned<T>> {
    rows.sort_by(|a, b| key(&a.record).cmp(&key(&b.record)));
    rows
}

/// Workflow store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn plans_of(tables: &Tables, customer: core_kernel::CustomerId) -> HashSet<PlanId> {
        tables
            .plans
            .values()
            .filter(|p| p.record.customer_id == customer)
            .map(|p| p.record.id)
            .collect()
    }
}

impl DomainPort for InMemoryWorkflowStore {}

#[async_trait]
impl HealthCheckable for InMemoryWorkflowStore {
    async fn health_check(&self) -> HealthCheckResult {
        let tables = self.tables.read().await;
        HealthCheckResult {
            adapter_id: "in-memory-workflow-store".to_string(),
            status: AdapterHealth::Healthy,
            message: Some(format!(
                "{} plans, {} claims, {} payments, {} repair orders",
                tables.plans.len(),
                tables.claims.len(),
                tables.payments.len(),
                tables.repair_orders.len()
            )),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn plan(&self, id: PlanId) -> Result<Versioned<CoveragePlan>, PortError> {
        self.tables
            .read()
            .await
            .plans
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found(CoveragePlan::ENTITY, id))
    }

    async fn claim(&self, id: ClaimId) -> Result<Versioned<Claim>, PortError> {
        self.tables
            .read()
            .await
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found(Claim::ENTITY, id))
    }

    async fn assessment(&self, id: AssessmentId) -> Result<Versioned<TechnicalAssessment>, PortError> {
        self.tables
            .read()
            .await
            .assessments
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found(TechnicalAssessment::ENTITY, id))
    }

    async fn payment(&self, id: PaymentId) -> Result<Versioned<PaymentRecord>, PortError> {
        self.tables
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found(PaymentRecord::ENTITY, id))
    }

    async fn repair_order(&self, id: RepairOrderId) -> Result<Versioned<RepairOrder>, PortError> {
        self.tables
            .read()
            .await
            .repair_orders
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found(RepairOrder::ENTITY, id))
    }

    async fn claim_by_number(&self, claim_number: &str) -> Result<Option<Versioned<Claim>>, PortError> {
        Ok(self
            .tables
            .read()
            .await
            .claims
            .values()
            .find(|c| c.record.claim_number == claim_number)
            .cloned())
    }

    async fn payment_by_reference(&self, reference: &str) -> Result<Option<Versioned<PaymentRecord>>, PortError> {
        Ok(self
            .tables
            .read()
            .await
            .payments
            .values()
            .find(|p| p.record.payment_reference == reference)
            .cloned())
    }

    async fn payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Versioned<PaymentRecord>>, PortError> {
        Ok(self
            .tables
            .read()
            .await
            .payments
            .values()
            .find(|p| p.record.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn repair_order_by_number(&self, order_number: &str) -> Result<Option<Versioned<RepairOrder>>, PortError> {
        Ok(self
            .tables
            .read()
            .await
            .repair_orders
            .values()
            .find(|o| o.record.order_number == order_number)
            .cloned())
    }

    async fn repair_order_for_claim(&self, claim_id: ClaimId) -> Result<Option<Versioned<RepairOrder>>, PortError> {
        Ok(self
            .tables
            .read()
            .await
            .repair_orders
            .values()
            .find(|o| o.record.claim_id == claim_id)
            .cloned())
    }

    async fn find_plans(&self, query: &PlanQuery) -> Result<Vec<Versioned<CoveragePlan>>, PortError> {
        let tables = self.tables.read().await;
        let rows = tables
            .plans
            .values()
            .filter(|p| {
                let plan = &p.record;
                query.customer_id.map_or(true, |c| plan.customer_id == c)
                    && query.status.map_or(true, |s| plan.status == s)
                    && query.ends_before.map_or(true, |at| plan.window.has_ended(at))
            })
            .cloned()
            .collect();
        Ok(sorted(rows, |p| (p.created_at, p.id)))
    }

    async fn find_claims(&self, query: &ClaimQuery) -> Result<Vec<Versioned<Claim>>, PortError> {
        let tables = self.tables.read().await;
        let customer_plans = query.customer_id.map(|c| Self::plans_of(&tables, c));
        let rows = tables
            .claims
            .values()
            .filter(|c| {
                let claim = &c.record;
                query.plan_id.map_or(true, |p| claim.plan_id == p)
                    && customer_plans.as_ref().map_or(true, |plans| plans.contains(&claim.plan_id))
                    && query.status.map_or(true, |s| claim.status == s)
            })
            .cloned()
            .collect();
        Ok(sorted(rows, |c| (c.created_at, c.id)))
    }

    async fn find_payments(&self, query: &PaymentQuery) -> Result<Vec<Versioned<PaymentRecord>>, PortError> {
        let tables = self.tables.read().await;
        let customer_plans = query.customer_id.map(|c| Self::plans_of(&tables, c));
        let rows = tables
            .payments
            .values()
            .filter(|p| {
                let payment = &p.record;
                query.plan_id.map_or(true, |id| payment.plan_id == id)
                    && customer_plans.as_ref().map_or(true, |plans| plans.contains(&payment.plan_id))
                    && query.status.map_or(true, |s| payment.status == s)
                    && query.method.map_or(true, |m| payment.payment_method == m)
                    && query.paid_from.map_or(true, |at| payment.payment_date >= at)
                    && query.paid_to.map_or(true, |at| payment.payment_date <= at)
                    && query.paid_before.map_or(true, |at| payment.payment_date < at)
            })
            .cloned()
            .collect();
        Ok(sorted(rows, |p| (p.payment_date, p.id)))
    }

    async fn find_repair_orders(&self, query: &RepairOrderQuery) -> Result<Vec<Versioned<RepairOrder>>, PortError> {
        let tables = self.tables.read().await;
        let customer_claims: Option<HashSet<ClaimId>> = query.customer_id.map(|customer| {
            let plans = Self::plans_of(&tables, customer);
            tables
                .claims
                .values()
                .filter(|c| plans.contains(&c.record.plan_id))
                .map(|c| c.record.id)
                .collect()
        });
        let needle = query.provider_contains.as_ref().map(|p| p.to_lowercase());

        let rows = tables
            .repair_orders
            .values()
            .filter(|o| {
                let order = &o.record;
                query.claim_id.map_or(true, |id| order.claim_id == id)
                    && customer_claims.as_ref().map_or(true, |claims| claims.contains(&order.claim_id))
                    && query.status.map_or(true, |s| order.status == s)
                    && needle
                        .as_ref()
                        .map_or(true, |n| order.provider_name.to_lowercase().contains(n.as_str()))
                    && query.overdue_at.map_or(true, |at| order.is_overdue(at))
            })
            .cloned()
            .collect();
        Ok(sorted(rows, |o| (o.created_at, o.id)))
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        let mut undo: Vec<Restore> = Vec::with_capacity(changes.len());
        for change in changes.into_changes() {
            match apply(&mut *tables, change) {
                Ok(restore) => undo.push(restore),
                Err(e) => {
                    for restore in undo.into_iter().rev() {
                        restore(&mut *tables);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl InMemoryWorkflowStore {
    /// Number of stored records of each kind, for diagnostics
    pub async fn counts(&self) -> StoreCounts {
        let tables = self.tables.read().await;
        StoreCounts {
            plans: tables.plans.len(),
            claims: tables.claims.len(),
            assessments: tables.assessments.len(),
            payments: tables.payments.len(),
            repair_orders: tables.repair_orders.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub plans: usize,
    pub claims: usize,
    pub assessments: usize,
    pub payments: usize,
    pub repair_orders: usize,
}
