//! Technical assessment of a claimed asset

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{AssessmentId, ClaimId, Money};
use crate::error::ClaimError;

/// Assessor's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentResult {
    Repairable,
    BeyondRepair,
    ReplacementNeeded,
    MinorIssue,
    MajorIssue,
}

/// Findings recorded against one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAssessment {
    pub id: AssessmentId,
    pub claim_id: ClaimId,
    pub assessor_name: String,
    pub assessment_date: DateTime<Utc>,
    pub findings: String,
    pub recommendations: Option<String>,
    pub result: AssessmentResult,
    pub estimated_repair_cost: Option<Money>,
    pub covered_by_warranty: bool,
    pub covered_by_insurance: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TechnicalAssessment {
    pub fn record(
        id: AssessmentId,
        claim_id: ClaimId,
        request: NewAssessment,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        request.validate()?;
        if request.assessor_name.trim().is_empty() || request.findings.trim().is_empty() {
            return Err(ClaimError::validation("assessor name and findings are required"));
        }
        if request.estimated_repair_cost.is_some_and(|c| c.is_negative()) {
            return Err(ClaimError::validation("estimated repair cost must not be negative"));
        }

        Ok(Self {
            id,
            claim_id,
            assessor_name: request.assessor_name,
            assessment_date: request.assessment_date.unwrap_or(now),
            findings: request.findings,
            recommendations: request.recommendations,
            result: request.result,
            estimated_repair_cost: request.estimated_repair_cost,
            covered_by_warranty: request.covered_by_warranty,
            covered_by_insurance: request.covered_by_insurance,
            created_at: now,
            updated_at: now,
        })
    }

    /// True when the result calls for a repair order rather than a payout
    pub fn recommends_repair(&self) -> bool {
        matches!(
            self.result,
            AssessmentResult::Repairable | AssessmentResult::MinorIssue | AssessmentResult::MajorIssue
        )
    }
}

/// Request to record an assessment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAssessment {
    #[validate(length(min = 1, max = 200))]
    pub assessor_name: String,
    /// Defaults to the time of recording
    pub assessment_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1))]
    pub findings: String,
    pub recommendations: Option<String>,
    pub result: AssessmentResult,
    pub estimated_repair_cost: Option<Money>,
    #[serde(default)]
    pub covered_by_warranty: bool,
    #[serde(default)]
    pub covered_by_insurance: bool,
}
