//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{AssessmentId, ClaimId, Money, PlanId, StatusMachine};
use crate::error::ClaimError;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Received, not yet looked at
    Submitted,
    /// Being assessed
    UnderReview,
    /// Accepted for repair or compensation
    Approved,
    /// Declined
    Rejected,
    /// Asset is with a repair provider
    InRepair,
    /// Settled
    Completed,
    /// Withdrawn during repair
    Cancelled,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Submitted => "SUBMITTED",
            ClaimStatus::UnderReview => "UNDER_REVIEW",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Rejected => "REJECTED",
            ClaimStatus::InRepair => "IN_REPAIR",
            ClaimStatus::Completed => "COMPLETED",
            ClaimStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusMachine for ClaimStatus {
    const ENTITY: &'static str = "Claim";

    fn all() -> &'static [Self] {
        use ClaimStatus::*;
        &[Submitted, UnderReview, Approved, Rejected, InRepair, Completed, Cancelled]
    }

    fn successors(&self) -> &'static [Self] {
        use ClaimStatus::*;
        match self {
            Submitted => &[UnderReview, Rejected],
            UnderReview => &[Approved, Rejected, InRepair],
            Approved => &[InRepair, Completed],
            InRepair => &[Completed, Cancelled],
            Rejected | Completed | Cancelled => &[],
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Rejected | ClaimStatus::Completed | ClaimStatus::Cancelled
        )
    }
}

/// Type of incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Theft,
    Damage,
    Malfunction,
    Loss,
    Accident,
    Other,
}

/// A claim against a coverage plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Business claim number (`CLM-...`)
    pub claim_number: String,
    /// Plan the claim is made against
    pub plan_id: PlanId,
    /// When the incident happened
    pub incident_date: DateTime<Utc>,
    /// What happened
    pub description: String,
    /// Status
    pub status: ClaimStatus,
    /// Type of incident
    pub claim_type: ClaimType,
    /// Amount asked for
    pub claimed_amount: Option<Money>,
    /// Amount granted on approval
    pub approved_amount: Option<Money>,
    /// Linked technical assessment
    pub assessment_id: Option<AssessmentId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Builds a SUBMITTED claim from a request
    ///
    /// The caller resolves the claim number and checks the plan.
    pub fn submit(
        id: ClaimId,
        claim_number: String,
        request: NewClaim,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        request.validate()?;
        if request.description.trim().is_empty() {
            return Err(ClaimError::validation("description must not be blank"));
        }
        if request.incident_date > now {
            return Err(ClaimError::validation(format!(
                "incident date {} is in the future",
                request.incident_date.to_rfc3339()
            )));
        }
        if request.claimed_amount.is_some_and(|a| a.is_negative()) {
            return Err(ClaimError::validation("claimed amount must not be negative"));
        }

        Ok(Self {
            id,
            claim_number,
            plan_id: request.plan_id,
            incident_date: request.incident_date,
            description: request.description,
            status: ClaimStatus::Submitted,
            claim_type: request.claim_type,
            claimed_amount: request.claimed_amount,
            approved_amount: None,
            assessment_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the status
    pub fn update_status(&mut self, status: ClaimStatus, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.status.ensure_transition(status)?;
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Approves the claim for the given amount
    pub fn approve(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if amount.is_negative() {
            return Err(ClaimError::validation("approved amount must not be negative"));
        }
        self.update_status(ClaimStatus::Approved, now)?;
        self.approved_amount = Some(amount);
        Ok(())
    }

    /// Links a technical assessment; a claim carries at most one
    pub fn attach_assessment(&mut self, assessment_id: AssessmentId, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::Closed {
                status: self.status.to_string(),
            });
        }
        if let Some(existing) = self.assessment_id {
            return Err(ClaimError::AlreadyAssessed {
                claim_number: self.claim_number.clone(),
                assessment_id: existing.to_string(),
            });
        }
        self.assessment_id = Some(assessment_id);
        self.updated_at = now;
        Ok(())
    }
}

/// Request to submit a claim
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewClaim {
    pub plan_id: PlanId,
    /// Supplied number, generated when absent
    #[validate(length(min = 1, max = 64))]
    pub claim_number: Option<String>,
    pub incident_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub description: String,
    pub claim_type: ClaimType,
    pub claimed_amount: Option<Money>,
}
