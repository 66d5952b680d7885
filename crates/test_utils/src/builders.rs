//! Test Data Builders
//!
//! Builders for the creation requests accepted by the coordinators. Tests
//! set only the fields they care about; everything else gets a valid
//! default relative to [`TemporalFixtures::now`].

use chrono::{DateTime, Duration, Utc};
use core_kernel::{AssetId, ClaimId, CustomerId, Money, PlanId};
use domain_billing::{NewPayment, PaymentMethod, PaymentStatus};
use domain_claims::{AssessmentResult, ClaimType, NewAssessment, NewClaim, NewRepairOrder};
use domain_plan::{NewCoveragePlan, PlanStatus};

use crate::fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for plan creation requests
pub struct TestPlanRequestBuilder {
    request: NewCoveragePlan,
}

impl Default for TestPlanRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPlanRequestBuilder {
    /// A one-year ACTIVE plan for a fresh customer, starting now
    pub fn new() -> Self {
        Self {
            request: NewCoveragePlan {
                name: StringFixtures::plan_name().to_string(),
                description: Some("Accidental damage and theft".to_string()),
                customer_id: CustomerId::new(),
                asset_id: AssetId::new(),
                start_date: TemporalFixtures::now(),
                end_date: TemporalFixtures::plan_end(),
                premium: MoneyFixtures::premium(),
                coverage_limit: MoneyFixtures::coverage_limit(),
                deductible: MoneyFixtures::deductible(),
                status: None,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.request.name = name.into();
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.request.customer_id = customer_id;
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.request.start_date = start;
        self.request.end_date = end;
        self
    }

    pub fn with_premium(mut self, premium: Money) -> Self {
        self.request.premium = premium;
        self
    }

    pub fn with_status(mut self, status: PlanStatus) -> Self {
        self.request.status = Some(status);
        self
    }

    pub fn build(self) -> NewCoveragePlan {
        self.request
    }
}

/// Builder for claim requests
pub struct TestClaimRequestBuilder {
    request: NewClaim,
}

impl TestClaimRequestBuilder {
    /// A damage claim for an incident one hour ago
    pub fn new(plan_id: PlanId) -> Self {
        Self {
            request: NewClaim {
                plan_id,
                claim_number: None,
                incident_date: TemporalFixtures::now() - Duration::hours(1),
                description: "Screen cracked after a drop".to_string(),
                claim_type: ClaimType::Damage,
                claimed_amount: Some(MoneyFixtures::repair_estimate()),
            },
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.request.claim_number = Some(number.into());
        self
    }

    pub fn with_incident_date(mut self, at: DateTime<Utc>) -> Self {
        self.request.incident_date = at;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.request.description = description.into();
        self
    }

    pub fn with_type(mut self, claim_type: ClaimType) -> Self {
        self.request.claim_type = claim_type;
        self
    }

    pub fn build(self) -> NewClaim {
        self.request
    }
}

/// Builder for payment requests
pub struct TestPaymentRequestBuilder {
    request: NewPayment,
}

impl TestPaymentRequestBuilder {
    /// A card payment of exactly the fixture premium, with every optional
    /// field left for the coordinator to fill in
    pub fn new(plan_id: PlanId) -> Self {
        Self {
            request: NewPayment {
                plan_id,
                amount: MoneyFixtures::premium(),
                payment_method: PaymentMethod::CreditCard,
                payment_reference: None,
                payment_date: None,
                status: None,
                transaction_id: None,
                payer_info: Some("Card ending 4242".to_string()),
                payment_details: None,
            },
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.request.amount = amount;
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.request.payment_method = method;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.request.payment_reference = Some(reference.into());
        self
    }

    pub fn paid_at(mut self, at: DateTime<Utc>) -> Self {
        self.request.payment_date = Some(at);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.request.status = Some(status);
        self
    }

    pub fn with_transaction_id(mut self, tx: impl Into<String>) -> Self {
        self.request.transaction_id = Some(tx.into());
        self
    }

    pub fn build(self) -> NewPayment {
        self.request
    }
}

/// Builder for repair order requests
pub struct TestRepairOrderRequestBuilder {
    request: NewRepairOrder,
}

impl TestRepairOrderRequestBuilder {
    /// An order due in five days with a reachable provider
    pub fn new(claim_id: ClaimId) -> Self {
        Self {
            request: NewRepairOrder {
                claim_id,
                order_number: None,
                provider_name: StringFixtures::provider_name().to_string(),
                provider_contact: Some(StringFixtures::provider_email().to_string()),
                provider_address: Some("12 Harbour Road".to_string()),
                description: "Replace display assembly".to_string(),
                diagnosed_issue: None,
                estimated_completion: Some(TemporalFixtures::days_ahead(5)),
                estimated_cost: Some(MoneyFixtures::repair_estimate()),
                warranty_days: Some(90),
            },
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.request.order_number = Some(number.into());
        self
    }

    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.request.provider_name = name.into();
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.request.provider_contact = Some(contact.into());
        self
    }

    pub fn with_estimated_completion(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.request.estimated_completion = at;
        self
    }

    pub fn build(self) -> NewRepairOrder {
        self.request
    }
}

/// Builder for technical assessment requests
pub struct TestAssessmentRequestBuilder {
    request: NewAssessment,
}

impl Default for TestAssessmentRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAssessmentRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: NewAssessment {
                assessor_name: StringFixtures::assessor_name().to_string(),
                assessment_date: None,
                findings: "Display cracked, digitizer intact".to_string(),
                recommendations: Some("Replace display".to_string()),
                result: AssessmentResult::Repairable,
                estimated_repair_cost: Some(MoneyFixtures::repair_estimate()),
                covered_by_warranty: false,
                covered_by_insurance: true,
            },
        }
    }

    pub fn with_result(mut self, result: AssessmentResult) -> Self {
        self.request.result = result;
        self
    }

    pub fn build(self) -> NewAssessment {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_builder_leaves_defaults_open() {
        let request = TestPaymentRequestBuilder::new(PlanId::new()).build();
        assert!(request.payment_reference.is_none());
        assert!(request.payment_date.is_none());
        assert!(request.status.is_none());
    }

    #[test]
    fn test_plan_builder_window_is_valid() {
        let request = TestPlanRequestBuilder::new().build();
        assert!(request.start_date <= request.end_date);
    }
}
