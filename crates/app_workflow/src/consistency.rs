//! Cross-entity consistency rules
//!
//! Payment status changes have side effects on the owning plan. The rules
//! here only mutate the plan in memory; the payment coordinator puts the
//! result in the same change set as the payment update so both land or
//! neither does.
//!
//! | payment change | plan before          | plan after                     |
//! |----------------|----------------------|--------------------------------|
//! | -> COMPLETED   | INACTIVE or EXPIRED  | ACTIVE, end + billing period   |
//! | -> COMPLETED   | anything else        | unchanged                      |
//! | -> REFUNDED    | ACTIVE               | SUSPENDED                      |
//! | -> REFUNDED    | anything else        | unchanged                      |

use chrono::{DateTime, Utc};

use core_kernel::{PlanId, Versioned};
use domain_plan::{CoveragePlan, PlanStatus};

use crate::error::{WorkflowError, WorkflowResult};
use crate::ports::WorkflowStore;

/// Reactivates a lapsed plan after a completed payment
///
/// Returns whether the plan changed.
pub fn apply_completion_rule(
    plan: &mut CoveragePlan,
    billing_period_months: u32,
    now: DateTime<Utc>,
) -> WorkflowResult<bool> {
    if !matches!(plan.status, PlanStatus::Inactive | PlanStatus::Expired) {
        return Ok(false);
    }
    let window = plan.window.extend_months(billing_period_months).map_err(|e| {
        WorkflowError::inconsistency(format!("cannot extend plan {}: {}", plan.id, e))
    })?;
    plan.window = window;
    plan.status = PlanStatus::Active;
    plan.updated_at = now;
    Ok(true)
}

/// Suspends an active plan after a refund; never reactivates
pub fn apply_refund_rule(plan: &mut CoveragePlan, now: DateTime<Utc>) -> bool {
    if plan.status != PlanStatus::Active {
        return false;
    }
    plan.status = PlanStatus::Suspended;
    plan.updated_at = now;
    true
}

/// Loads the plan a rule applies to
///
/// A payment whose plan is gone is a broken invariant, not a missing input.
pub async fn load_plan(store: &dyn WorkflowStore, plan_id: PlanId) -> WorkflowResult<Versioned<CoveragePlan>> {
    match store.plan(plan_id).await {
        Ok(plan) => Ok(plan),
        Err(e) if e.is_not_found() => Err(WorkflowError::inconsistency(format!(
            "plan {} referenced by payment no longer exists",
            plan_id
        ))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_kernel::{AssetId, CoverageWindow, CustomerId, Money};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn plan(status: PlanStatus) -> CoveragePlan {
        let start = now() - Duration::days(60);
        CoveragePlan {
            id: PlanId::new(),
            name: "Phone".into(),
            description: None,
            customer_id: CustomerId::new(),
            asset_id: AssetId::new(),
            window: CoverageWindow::new(start, Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()).unwrap(),
            premium: Money::new(dec!(100)),
            coverage_limit: Money::new(dec!(1000)),
            deductible: Money::zero(),
            status,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_completion_reactivates_and_extends() {
        let mut p = plan(PlanStatus::Inactive);
        assert!(apply_completion_rule(&mut p, 1, now()).unwrap());
        assert_eq!(p.status, PlanStatus::Active);
        assert_eq!(p.window.end, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
        assert_eq!(p.updated_at, now());
    }

    #[test]
    fn test_completion_leaves_active_plan_alone() {
        let mut p = plan(PlanStatus::Active);
        let before = p.clone();
        assert!(!apply_completion_rule(&mut p, 1, now()).unwrap());
        assert_eq!(p, before);
    }

    #[test]
    fn test_completion_ignores_cancelled_plan() {
        let mut p = plan(PlanStatus::Cancelled);
        assert!(!apply_completion_rule(&mut p, 1, now()).unwrap());
        assert_eq!(p.status, PlanStatus::Cancelled);
    }

    #[test]
    fn test_refund_suspends_only_active() {
        let mut active = plan(PlanStatus::Active);
        assert!(apply_refund_rule(&mut active, now()));
        assert_eq!(active.status, PlanStatus::Suspended);

        let mut expired = plan(PlanStatus::Expired);
        assert!(!apply_refund_rule(&mut expired, now()));
        assert_eq!(expired.status, PlanStatus::Expired);
    }
}
