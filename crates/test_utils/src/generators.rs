//! Property-Based Test Generators
//!
//! Provides proptest strategies for statuses, amounts and payment methods.

use chrono::{DateTime, Duration, Utc};
use core_kernel::{Money, StatusMachine};
use domain_billing::{PaymentMethod, PaymentStatus};
use domain_claims::{ClaimStatus, RepairStatus};
use domain_plan::PlanStatus;
use proptest::prelude::*;
use proptest::sample::select;

use crate::fixtures::TemporalFixtures;

/// Any status of a state machine
pub fn status_strategy<S: StatusMachine>() -> impl Strategy<Value = S> {
    select(S::all())
}

pub fn plan_status_strategy() -> impl Strategy<Value = PlanStatus> {
    status_strategy::<PlanStatus>()
}

pub fn claim_status_strategy() -> impl Strategy<Value = ClaimStatus> {
    status_strategy::<ClaimStatus>()
}

pub fn payment_status_strategy() -> impl Strategy<Value = PaymentStatus> {
    status_strategy::<PaymentStatus>()
}

pub fn repair_status_strategy() -> impl Strategy<Value = RepairStatus> {
    status_strategy::<RepairStatus>()
}

pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    select(vec![
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::BankTransfer,
        PaymentMethod::Pix,
        PaymentMethod::BankSlip,
    ])
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating valid Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Instants up to `max_hours` before the fixture clock
pub fn past_instant_strategy(max_hours: i64) -> impl Strategy<Value = DateTime<Utc>> {
    (0..=max_hours).prop_map(|h| TemporalFixtures::now() - Duration::hours(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_positive_money_is_positive(m in positive_money_strategy()) {
            prop_assert!(m.is_positive());
        }

        #[test]
        fn test_past_instants_are_not_in_future(at in past_instant_strategy(1000)) {
            prop_assert!(at <= TemporalFixtures::now());
        }
    }
}
