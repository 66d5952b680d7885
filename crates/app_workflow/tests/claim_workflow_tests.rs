//! Claim coordinator and technical assessment tests

use chrono::Duration;
use rust_decimal_macros::dec;

use app_workflow::ErrorKind;
use core_kernel::{CacheScope, ClaimId, Money, PlanId, StatusMachine};
use domain_claims::{AssessmentResult, ClaimStatus, ClaimType};
use domain_plan::PlanStatus;
use test_utils::*;

// ============================================================================
// Submission Tests
// ============================================================================

mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_generates_number() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;

        let created = h
            .claims()
            .create(TestClaimRequestBuilder::new(plan.id).build())
            .await
            .unwrap();

        assert_eq!(created.version, 1);
        assert_eq!(created.record.status, ClaimStatus::Submitted);
        assert!(created.record.claim_number.starts_with("CLM-"));
        assert!(created.record.assessment_id.is_none());
    }

    #[tokio::test]
    async fn test_claim_on_cancelled_plan_rejected() {
        let h = TestHarness::new();
        let plan = h.plan_in_status(PlanStatus::Cancelled).await;
        let result = h
            .claims()
            .create(TestClaimRequestBuilder::new(plan.id).build())
            .await;
        assert_kind(result, ErrorKind::Validation);
        assert!(h.claims().for_plan(plan.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_claim_requires_active_plan() {
        let h = TestHarness::new();
        for status in [PlanStatus::Inactive, PlanStatus::Expired, PlanStatus::Suspended] {
            let plan = h.plan_in_status(status).await;
            let result = h
                .claims()
                .create(TestClaimRequestBuilder::new(plan.id).build())
                .await;
            assert_kind(result, ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_future_incident_rejected() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let request = TestClaimRequestBuilder::new(plan.id)
            .with_incident_date(h.now() + Duration::hours(1))
            .build();
        assert_kind(h.claims().create(request).await, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_blank_description_rejected() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let request = TestClaimRequestBuilder::new(plan.id).with_description("  ").build();
        assert_kind(h.claims().create(request).await, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_plan_is_not_found() {
        let h = TestHarness::new();
        let result = h
            .claims()
            .create(TestClaimRequestBuilder::new(PlanId::new()).build())
            .await;
        assert_kind(result, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_supplied_number_must_be_unused() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let request = || {
            TestClaimRequestBuilder::new(plan.id)
                .with_number("CLM-2025-0001")
                .with_type(ClaimType::Theft)
                .build()
        };

        let first = h.claims().create(request()).await.unwrap();
        assert_eq!(first.record.claim_number, "CLM-2025-0001");
        assert_eq!(first.record.claim_type, ClaimType::Theft);
        assert_kind(h.claims().create(request()).await, ErrorKind::Conflict);

        let found = h.claims().by_number("CLM-2025-0001").await.unwrap();
        assert_eq!(found.record.id, first.record.id);
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_review_then_approve() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.claim_under_review(&plan).await;

        let approved = h
            .claims()
            .approve(claim.id, Money::new(dec!(150.00)))
            .await
            .unwrap();
        assert_eq!(approved.version, 3);
        assert_eq!(approved.record.status, ClaimStatus::Approved);
        assert_eq!(approved.record.approved_amount, Some(Money::new(dec!(150.00))));
    }

    #[tokio::test]
    async fn test_approve_straight_from_submitted_rejected() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.submitted_claim(&plan).await;

        assert_invalid_transition(
            h.claims().approve(claim.id, Money::new(dec!(10))).await,
            "SUBMITTED",
            "APPROVED",
        );
        let stored = h.claims().get(claim.id).await.unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.record.approved_amount.is_none());
    }

    #[tokio::test]
    async fn test_negative_approved_amount_rejected() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.claim_under_review(&plan).await;
        let result = h.claims().approve(claim.id, Money::new(dec!(-1))).await;
        assert_kind(result, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_full_path_to_completed() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.claim_under_review(&plan).await;

        let claims = h.claims();
        claims.approve(claim.id, Money::new(dec!(180))).await.unwrap();
        claims.transition(claim.id, ClaimStatus::InRepair).await.unwrap();
        let done = claims.transition(claim.id, ClaimStatus::Completed).await.unwrap();
        assert_eq!(done.record.status, ClaimStatus::Completed);
        assert_eq!(done.version, 5);
    }

    #[tokio::test]
    async fn test_terminal_claims_reject_every_status() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.submitted_claim(&plan).await;
        h.claims().transition(claim.id, ClaimStatus::Rejected).await.unwrap();

        for next in ClaimStatus::all() {
            let result = h.claims().transition(claim.id, *next).await;
            assert_kind(result, ErrorKind::InvalidTransition);
        }
    }

    #[tokio::test]
    async fn test_unknown_claim_is_not_found() {
        let h = TestHarness::new();
        assert_kind(h.claims().get(ClaimId::new()).await, ErrorKind::NotFound);
        assert_kind(
            h.claims().transition(ClaimId::new(), ClaimStatus::UnderReview).await,
            ErrorKind::NotFound,
        );
    }
}

// ============================================================================
// Assessment Tests
// ============================================================================

mod assessment_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_assessment_links_claim() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.claim_under_review(&plan).await;

        let (updated, assessment) = h
            .claims()
            .record_assessment(
                claim.id,
                TestAssessmentRequestBuilder::new()
                    .with_result(AssessmentResult::Repairable)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(updated.record.assessment_id, Some(assessment.record.id));
        assert_eq!(updated.version, 3);
        assert_eq!(assessment.record.claim_id, claim.id);
        assert_eq!(assessment.record.assessment_date, h.now());

        let loaded = h.claims().assessment(claim.id).await.unwrap();
        assert_eq!(loaded.map(|a| a.id), Some(assessment.record.id));
    }

    #[tokio::test]
    async fn test_second_assessment_conflicts() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.claim_under_review(&plan).await;
        let claims = h.claims();

        claims
            .record_assessment(claim.id, TestAssessmentRequestBuilder::new().build())
            .await
            .unwrap();
        let again = claims
            .record_assessment(claim.id, TestAssessmentRequestBuilder::new().build())
            .await;
        assert_kind(again, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_closed_claim_cannot_be_assessed() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.submitted_claim(&plan).await;
        h.claims().transition(claim.id, ClaimStatus::Rejected).await.unwrap();

        let result = h
            .claims()
            .record_assessment(claim.id, TestAssessmentRequestBuilder::new().build())
            .await;
        assert_kind(result, ErrorKind::Validation);
        assert!(h.claims().assessment(claim.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_assessment_yet() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.submitted_claim(&plan).await;
        assert!(h.claims().assessment(claim.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cached_empty_assessment_refreshed_after_recording() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let claim = h.claim_under_review(&plan).await;
        assert!(h.claims().assessment(claim.id).await.unwrap().is_none());

        h.claims()
            .record_assessment(claim.id, TestAssessmentRequestBuilder::new().build())
            .await
            .unwrap();
        assert!(h.claims().assessment(claim.id).await.unwrap().is_some());
    }
}

// ============================================================================
// Query Tests
// ============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_claims_by_plan_customer_and_status() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let other_plan = h.active_plan().await;
        let first = h.submitted_claim(&plan).await;
        h.advance(Duration::minutes(1));
        let second = h.claim_under_review(&plan).await;
        h.submitted_claim(&other_plan).await;

        let for_plan = h.claims().for_plan(plan.id).await.unwrap();
        assert_eq!(
            for_plan.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );

        let for_customer = h.claims().for_customer(plan.customer_id).await.unwrap();
        assert_eq!(for_customer.len(), 2);

        let submitted = h.claims().by_status(ClaimStatus::Submitted).await.unwrap();
        assert_eq!(submitted.len(), 2);
        let reviewing = h.claims().by_status(ClaimStatus::UnderReview).await.unwrap();
        assert_eq!(reviewing.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id]);
    }

    #[tokio::test]
    async fn test_all_claims_refreshed_after_transition() {
        let h = TestHarness::new();
        let plan = h.active_plan().await;
        let other_plan = h.active_plan().await;
        let claim = h.submitted_claim(&plan).await;
        h.submitted_claim(&other_plan).await;

        let all = h.claims().all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| c.status == ClaimStatus::Submitted));

        h.claims().transition(claim.id, ClaimStatus::UnderReview).await.unwrap();
        assert!(h.cache.was_invalidated(CacheScope::Claims, "all"));

        let all = h.claims().all().await.unwrap();
        let reviewed = all.iter().find(|c| c.id == claim.id).unwrap();
        assert_eq!(reviewed.status, ClaimStatus::UnderReview);
    }
}
