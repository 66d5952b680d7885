//! Tests for domain_claims

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{AssessmentId, ClaimId, Money, PlanId, RepairOrderId, StatusMachine};

use domain_claims::assessment::{AssessmentResult, NewAssessment, TechnicalAssessment};
use domain_claims::claim::{Claim, ClaimStatus, ClaimType, NewClaim};
use domain_claims::repair::{NewRepairOrder, RepairOrder, RepairOrderUpdate, RepairStatus};
use domain_claims::ClaimError;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 8, 30, 0).unwrap()
}

fn new_claim() -> NewClaim {
    NewClaim {
        plan_id: PlanId::new(),
        claim_number: None,
        incident_date: now() - Duration::days(2),
        description: "Cracked screen after a fall".to_string(),
        claim_type: ClaimType::Damage,
        claimed_amount: Some(Money::new(dec!(250.00))),
    }
}

fn submitted_claim() -> Claim {
    Claim::submit(ClaimId::new(), "CLM-1".to_string(), new_claim(), now()).unwrap()
}

fn new_order() -> NewRepairOrder {
    NewRepairOrder {
        claim_id: ClaimId::new(),
        order_number: None,
        provider_name: "FixIt Ltd".to_string(),
        provider_contact: Some("desk@fixit.example".to_string()),
        provider_address: Some("1 High Street".to_string()),
        description: "Replace display".to_string(),
        diagnosed_issue: None,
        estimated_completion: Some(now() + Duration::days(5)),
        estimated_cost: Some(Money::new(dec!(180.00))),
        warranty_days: Some(90),
    }
}

fn open_order() -> RepairOrder {
    RepairOrder::open(RepairOrderId::new(), "RO-1".to_string(), new_order(), now()).unwrap()
}

fn order_in(status: RepairStatus) -> RepairOrder {
    let mut order = open_order();
    order.status = status;
    order
}

// ============================================================================
// Claim Tests
// ============================================================================

mod claim_tests {
    use super::*;

    #[test]
    fn test_submit_starts_submitted() {
        let claim = submitted_claim();
        assert_eq!(claim.status, ClaimStatus::Submitted);
        assert_eq!(claim.created_at, now());
        assert!(claim.approved_amount.is_none());
        assert!(claim.assessment_id.is_none());
    }

    #[test]
    fn test_submit_rejects_future_incident() {
        let mut req = new_claim();
        req.incident_date = now() + Duration::hours(1);
        assert!(matches!(
            Claim::submit(ClaimId::new(), "CLM-2".to_string(), req, now()),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn test_submit_accepts_incident_at_now() {
        let mut req = new_claim();
        req.incident_date = now();
        assert!(Claim::submit(ClaimId::new(), "CLM-3".to_string(), req, now()).is_ok());
    }

    #[test]
    fn test_submit_rejects_blank_description() {
        let mut req = new_claim();
        req.description = "  ".to_string();
        assert!(Claim::submit(ClaimId::new(), "CLM-4".to_string(), req, now()).is_err());
    }

    #[test]
    fn test_submit_rejects_negative_amount() {
        let mut req = new_claim();
        req.claimed_amount = Some(Money::new(dec!(-1)));
        assert!(Claim::submit(ClaimId::new(), "CLM-5".to_string(), req, now()).is_err());
    }

    #[test]
    fn test_review_then_approve() {
        let mut claim = submitted_claim();
        claim.update_status(ClaimStatus::UnderReview, now()).unwrap();
        claim.approve(Money::new(dec!(200.00)), now()).unwrap();

        assert_eq!(claim.status, ClaimStatus::Approved);
        assert_eq!(claim.approved_amount, Some(Money::new(dec!(200.00))));
    }

    #[test]
    fn test_approve_straight_from_submitted_fails() {
        let mut claim = submitted_claim();
        let err = claim.approve(Money::new(dec!(1)), now()).unwrap_err();
        match err {
            ClaimError::Transition(t) => {
                assert_eq!(t.from, "SUBMITTED");
                assert_eq!(t.to, "APPROVED");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(claim.approved_amount.is_none());
    }

    #[test]
    fn test_attach_assessment_once() {
        let mut claim = submitted_claim();
        claim.attach_assessment(AssessmentId::new(), now()).unwrap();
        assert!(matches!(
            claim.attach_assessment(AssessmentId::new(), now()),
            Err(ClaimError::AlreadyAssessed { .. })
        ));
    }

    #[test]
    fn test_attach_assessment_to_closed_claim_fails() {
        let mut claim = submitted_claim();
        claim.update_status(ClaimStatus::Rejected, now()).unwrap();
        assert!(matches!(
            claim.attach_assessment(AssessmentId::new(), now()),
            Err(ClaimError::Closed { .. })
        ));
    }

    #[test]
    fn test_terminal_claim_statuses() {
        for status in ClaimStatus::all() {
            let terminal = matches!(
                status,
                ClaimStatus::Rejected | ClaimStatus::Completed | ClaimStatus::Cancelled
            );
            assert_eq!(status.is_terminal(), terminal, "{}", status);
            if terminal {
                for next in ClaimStatus::all() {
                    assert!(!status.can_transition_to(*next));
                }
            }
        }
    }
}

// ============================================================================
// Assessment Tests
// ============================================================================

mod assessment_tests {
    use super::*;

    fn request() -> NewAssessment {
        NewAssessment {
            assessor_name: "R. Silva".to_string(),
            assessment_date: None,
            findings: "Display cracked, frame intact".to_string(),
            recommendations: Some("Replace display".to_string()),
            result: AssessmentResult::Repairable,
            estimated_repair_cost: Some(Money::new(dec!(150.00))),
            covered_by_warranty: false,
            covered_by_insurance: true,
        }
    }

    #[test]
    fn test_record_defaults_date_to_now() {
        let assessment =
            TechnicalAssessment::record(AssessmentId::new(), ClaimId::new(), request(), now()).unwrap();
        assert_eq!(assessment.assessment_date, now());
        assert!(assessment.recommends_repair());
    }

    #[test]
    fn test_record_rejects_missing_findings() {
        let mut req = request();
        req.findings = String::new();
        assert!(TechnicalAssessment::record(AssessmentId::new(), ClaimId::new(), req, now()).is_err());
    }

    #[test]
    fn test_beyond_repair_does_not_recommend_repair() {
        let mut req = request();
        req.result = AssessmentResult::BeyondRepair;
        let assessment =
            TechnicalAssessment::record(AssessmentId::new(), ClaimId::new(), req, now()).unwrap();
        assert!(!assessment.recommends_repair());
    }
}

// ============================================================================
// Repair Order Tests
// ============================================================================

mod repair_order_tests {
    use super::*;

    #[test]
    fn test_open_is_pending() {
        let order = open_order();
        assert_eq!(order.status, RepairStatus::Pending);
        assert!(order.actual_completion.is_none());
    }

    #[test]
    fn test_open_rejects_past_estimate() {
        let mut req = new_order();
        req.estimated_completion = Some(now() - Duration::minutes(1));
        assert!(RepairOrder::open(RepairOrderId::new(), "RO-2".to_string(), req, now()).is_err());
    }

    #[test]
    fn test_open_rejects_bad_contact_email() {
        let mut req = new_order();
        req.provider_contact = Some("not-an-email".to_string());
        assert!(matches!(
            RepairOrder::open(RepairOrderId::new(), "RO-3".to_string(), req, now()),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn test_open_allows_missing_contact() {
        let mut req = new_order();
        req.provider_contact = None;
        assert!(RepairOrder::open(RepairOrderId::new(), "RO-4".to_string(), req, now()).is_ok());
    }

    #[test]
    fn test_entering_completed_stamps_completion() {
        let mut order = order_in(RepairStatus::InProgress);
        let done = now() + Duration::days(3);
        order.update_status(RepairStatus::Completed, done).unwrap();
        assert_eq!(order.actual_completion, Some(done));
    }

    #[test]
    fn test_complete_records_cost_and_parts() {
        let mut order = order_in(RepairStatus::InProgress);
        order
            .complete(Money::new(dec!(175.50)), Some("display".to_string()), now())
            .unwrap();
        assert_eq!(order.status, RepairStatus::Completed);
        assert_eq!(order.repair_cost, Some(Money::new(dec!(175.50))));
        assert_eq!(order.parts_replaced.as_deref(), Some("display"));
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let mut order = order_in(RepairStatus::Diagnosis);
        assert!(matches!(
            order.complete(Money::zero(), None, now()),
            Err(ClaimError::Transition(_))
        ));
    }

    #[test]
    fn test_cancel_appends_reason() {
        let mut order = open_order();
        order.technician_notes = Some("Waiting on customer".to_string());
        order.cancel(Some("customer withdrew"), now()).unwrap();
        assert_eq!(
            order.technician_notes.as_deref(),
            Some("Waiting on customer\nCancellation: customer withdrew")
        );
    }

    #[test]
    fn test_cancel_with_blank_reason_leaves_notes() {
        let mut order = open_order();
        order.cancel(Some("   "), now()).unwrap();
        assert!(order.technician_notes.is_none());
        assert_eq!(order.status, RepairStatus::Cancelled);
    }

    #[test]
    fn test_overdue_only_while_open() {
        let order = open_order();
        let late = now() + Duration::days(6);
        assert!(!order.is_overdue(now()));
        assert!(order.is_overdue(late));

        let done = order_in(RepairStatus::Completed);
        assert!(!done.is_overdue(late));
    }

    #[test]
    fn test_follow_up_needs_old_completion_and_old_update() {
        let mut order = order_in(RepairStatus::Completed);
        order.actual_completion = Some(now() - Duration::days(40));
        order.updated_at = now() - Duration::days(35);
        assert!(order.needs_follow_up(now(), Duration::days(30)));

        order.updated_at = now() - Duration::days(1);
        assert!(!order.needs_follow_up(now(), Duration::days(30)));
    }

    #[test]
    fn test_deletable_states() {
        assert!(order_in(RepairStatus::Pending).is_deletable());
        assert!(order_in(RepairStatus::Cancelled).is_deletable());
        assert!(!order_in(RepairStatus::InProgress).is_deletable());
        assert!(!order_in(RepairStatus::Completed).is_deletable());
    }

    #[test]
    fn test_update_rejected_once_closed() {
        let mut order = order_in(RepairStatus::Cancelled);
        let update = RepairOrderUpdate {
            diagnosed_issue: Some("n/a".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            order.apply_details(update, now()),
            Err(ClaimError::Closed { .. })
        ));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn any_claim_status() -> impl Strategy<Value = ClaimStatus> {
    prop::sample::select(ClaimStatus::all().to_vec())
}

fn any_repair_status() -> impl Strategy<Value = RepairStatus> {
    prop::sample::select(RepairStatus::all().to_vec())
}

proptest! {
    #[test]
    fn prop_terminal_claim_rejects_any_next(from in any_claim_status(), to in any_claim_status()) {
        let mut claim = submitted_claim();
        claim.status = from;
        let result = claim.update_status(to, now());
        if from.is_terminal() {
            prop_assert!(result.is_err());
            prop_assert_eq!(claim.status, from);
        } else {
            prop_assert_eq!(result.is_ok(), from.can_transition_to(to));
        }
    }

    #[test]
    fn prop_terminal_repair_rejects_any_next(from in any_repair_status(), to in any_repair_status()) {
        let mut order = order_in(from);
        let result = order.update_status(to, now());
        if from.is_terminal() {
            prop_assert!(result.is_err());
            prop_assert_eq!(order.status, from);
        }
    }
}
