//! Persistence port for the workflow engine
//!
//! Coordinators read records one at a time or through the query structs
//! below, and write exclusively through [`WorkflowStore::commit`], which
//! applies a whole [`ChangeSet`] or nothing.
//!
//! Versioning contract: an inserted record is stored at version 1 and every
//! successful update stores `expected_version + 1`. An update or delete whose
//! expected version differs from the stored one fails the commit with
//! [`PortError::VersionConflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{
    AssessmentId, ClaimId, CustomerId, DomainPort, PaymentId, PlanId, PortError, RepairOrderId,
    Versioned,
};
use domain_billing::{PaymentMethod, PaymentRecord, PaymentStatus};
use domain_claims::{Claim, ClaimStatus, RepairOrder, RepairStatus, TechnicalAssessment};
use domain_plan::{CoveragePlan, PlanStatus};

/// Store used by the coordinators and jobs
#[async_trait]
pub trait WorkflowStore: DomainPort {
    async fn plan(&self, id: PlanId) -> Result<Versioned<CoveragePlan>, PortError>;

    async fn claim(&self, id: ClaimId) -> Result<Versioned<Claim>, PortError>;

    async fn assessment(&self, id: AssessmentId) -> Result<Versioned<TechnicalAssessment>, PortError>;

    async fn payment(&self, id: PaymentId) -> Result<Versioned<PaymentRecord>, PortError>;

    async fn repair_order(&self, id: RepairOrderId) -> Result<Versioned<RepairOrder>, PortError>;

    async fn claim_by_number(&self, claim_number: &str) -> Result<Option<Versioned<Claim>>, PortError>;

    async fn payment_by_reference(&self, reference: &str) -> Result<Option<Versioned<PaymentRecord>>, PortError>;

    async fn payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Versioned<PaymentRecord>>, PortError>;

    async fn repair_order_by_number(&self, order_number: &str) -> Result<Option<Versioned<RepairOrder>>, PortError>;

    async fn repair_order_for_claim(&self, claim_id: ClaimId) -> Result<Option<Versioned<RepairOrder>>, PortError>;

    async fn find_plans(&self, query: &PlanQuery) -> Result<Vec<Versioned<CoveragePlan>>, PortError>;

    async fn find_claims(&self, query: &ClaimQuery) -> Result<Vec<Versioned<Claim>>, PortError>;

    async fn find_payments(&self, query: &PaymentQuery) -> Result<Vec<Versioned<PaymentRecord>>, PortError>;

    async fn find_repair_orders(&self, query: &RepairOrderQuery) -> Result<Vec<Versioned<RepairOrder>>, PortError>;

    /// Applies every change or none of them
    async fn commit(&self, changes: ChangeSet) -> Result<(), PortError>;
}

// ============================================================================
// Change sets
// ============================================================================

/// A single record write
#[derive(Debug, Clone, PartialEq)]
pub enum Write<T> {
    Insert(T),
    Update { record: T, expected_version: u64 },
}

impl<T> Write<T> {
    pub fn record(&self) -> &T {
        match self {
            Write::Insert(record) => record,
            Write::Update { record, .. } => record,
        }
    }
}

/// One entry of a [`ChangeSet`]
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Plan(Write<CoveragePlan>),
    Claim(Write<Claim>),
    Assessment(Write<TechnicalAssessment>),
    Payment(Write<PaymentRecord>),
    RepairOrder(Write<RepairOrder>),
    DeletePayment { id: PaymentId, expected_version: u64 },
    DeleteRepairOrder { id: RepairOrderId, expected_version: u64 },
}

macro_rules! change_from_write {
    ($variant:ident, $ty:ty) => {
        impl From<Write<$ty>> for Change {
            fn from(write: Write<$ty>) -> Self {
                Change::$variant(write)
            }
        }
    };
}

change_from_write!(Plan, CoveragePlan);
change_from_write!(Claim, Claim);
change_from_write!(Assessment, TechnicalAssessment);
change_from_write!(Payment, PaymentRecord);
change_from_write!(RepairOrder, RepairOrder);

/// The atomic unit of work committed to the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new record
    pub fn insert<T>(mut self, record: T) -> Self
    where
        Write<T>: Into<Change>,
    {
        self.changes.push(Write::Insert(record).into());
        self
    }

    /// Writes back a record loaded at `current.version`
    pub fn update<T>(mut self, current: Versioned<T>) -> Self
    where
        Write<T>: Into<Change>,
    {
        self.changes.push(
            Write::Update {
                record: current.record,
                expected_version: current.version,
            }
            .into(),
        );
        self
    }

    pub fn delete_payment(mut self, id: PaymentId, expected_version: u64) -> Self {
        self.changes.push(Change::DeletePayment { id, expected_version });
        self
    }

    pub fn delete_repair_order(mut self, id: RepairOrderId, expected_version: u64) -> Self {
        self.changes.push(Change::DeleteRepairOrder { id, expected_version });
        self
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Plan filters; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanQuery {
    pub customer_id: Option<CustomerId>,
    pub status: Option<PlanStatus>,
    /// Window end strictly before this instant
    pub ends_before: Option<DateTime<Utc>>,
}

impl PlanQuery {
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn by_status(status: PlanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: PlanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn ending_before(mut self, at: DateTime<Utc>) -> Self {
        self.ends_before = Some(at);
        self
    }
}

/// Claim filters; `customer_id` joins through the claim's plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimQuery {
    pub plan_id: Option<PlanId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<ClaimStatus>,
}

impl ClaimQuery {
    pub fn for_plan(plan_id: PlanId) -> Self {
        Self {
            plan_id: Some(plan_id),
            ..Default::default()
        }
    }

    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn by_status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Payment filters; `customer_id` joins through the payment's plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentQuery {
    pub plan_id: Option<PlanId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    /// Paid at or after (inclusive)
    pub paid_from: Option<DateTime<Utc>>,
    /// Paid at or before (inclusive)
    pub paid_to: Option<DateTime<Utc>>,
    /// Paid strictly before
    pub paid_before: Option<DateTime<Utc>>,
}

impl PaymentQuery {
    pub fn for_plan(plan_id: PlanId) -> Self {
        Self {
            plan_id: Some(plan_id),
            ..Default::default()
        }
    }

    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn by_status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn by_method(method: PaymentMethod) -> Self {
        Self {
            method: Some(method),
            ..Default::default()
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            paid_from: Some(start),
            paid_to: Some(end),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paid_before(mut self, at: DateTime<Utc>) -> Self {
        self.paid_before = Some(at);
        self
    }
}

/// Repair order filters; `customer_id` joins through claim and plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairOrderQuery {
    pub claim_id: Option<ClaimId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<RepairStatus>,
    /// Case-insensitive substring of the provider name
    pub provider_contains: Option<String>,
    /// Open orders whose estimate is before this instant
    pub overdue_at: Option<DateTime<Utc>>,
}

impl RepairOrderQuery {
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn by_status(status: RepairStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn by_provider(name: impl Into<String>) -> Self {
        Self {
            provider_contains: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn overdue_at(at: DateTime<Utc>) -> Self {
        Self {
            overdue_at: Some(at),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: RepairStatus) -> Self {
        self.status = Some(status);
        self
    }
}
