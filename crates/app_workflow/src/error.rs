//! Workflow errors
//!
//! Every coordinator operation fails with a [`WorkflowError`]. Domain and
//! port errors are folded in at the coordinator boundary so callers only
//! need to look at [`WorkflowError::kind`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use core_kernel::{Money, PortError, TransitionError};
use domain_billing::BillingError;
use domain_claims::ClaimError;
use domain_plan::PlanError;

/// Broad error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    InvalidTransition,
    StateInconsistency,
    Storage,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Payment amount {paid} does not match plan premium {premium}")]
    AmountMismatch { paid: Money, premium: Money },

    #[error("Payment is not refundable: status {status}, paid on {payment_date}")]
    NotRefundable {
        status: String,
        payment_date: DateTime<Utc>,
    },

    /// Duplicate unique key or a lost optimistic race; safe to retry
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("State inconsistency: {0}")]
    StateInconsistency(String),

    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

impl WorkflowError {
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        WorkflowError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        WorkflowError::Conflict(message.into())
    }

    pub fn inconsistency(message: impl Into<String>) -> Self {
        WorkflowError::StateInconsistency(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::Validation(_)
            | WorkflowError::AmountMismatch { .. }
            | WorkflowError::NotRefundable { .. } => ErrorKind::Validation,
            WorkflowError::Conflict(_) => ErrorKind::Conflict,
            WorkflowError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            WorkflowError::StateInconsistency(_) => ErrorKind::StateInconsistency,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Conflict(_) => true,
            WorkflowError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<PortError> for WorkflowError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => WorkflowError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Duplicate { .. } | PortError::VersionConflict { .. } => {
                WorkflowError::Conflict(err.to_string())
            }
            PortError::Validation { message, .. } => WorkflowError::Validation(message),
            other => WorkflowError::Storage(other),
        }
    }
}

impl From<TransitionError> for WorkflowError {
    fn from(err: TransitionError) -> Self {
        WorkflowError::InvalidTransition {
            entity: err.entity,
            from: err.from,
            to: err.to,
        }
    }
}

impl From<PlanError> for WorkflowError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Transition(t) => t.into(),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

impl From<ClaimError> for WorkflowError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Transition(t) => t.into(),
            ClaimError::AlreadyAssessed { .. } => WorkflowError::Conflict(err.to_string()),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

impl From<BillingError> for WorkflowError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::AmountMismatch { paid, premium } => {
                WorkflowError::AmountMismatch { paid, premium }
            }
            BillingError::NotRefundable { status, payment_date } => {
                WorkflowError::NotRefundable { status, payment_date }
            }
            BillingError::Transition(t) => t.into(),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_errors_map_to_kinds() {
        let cases = [
            (PortError::not_found("Claim", "x"), ErrorKind::NotFound),
            (PortError::duplicate("Claim", "claim_number", "CLM-1"), ErrorKind::Conflict),
            (PortError::version_conflict("Claim", "x", 1, 2), ErrorKind::Conflict),
            (PortError::validation("bad"), ErrorKind::Validation),
            (PortError::connection("down"), ErrorKind::Storage),
        ];
        for (port, kind) in cases {
            assert_eq!(WorkflowError::from(port).kind(), kind);
        }
    }

    #[test]
    fn test_transition_error_keeps_states() {
        let err: WorkflowError = TransitionError::new("Claim", "COMPLETED", "SUBMITTED").into();
        match err {
            WorkflowError::InvalidTransition { entity, from, to } => {
                assert_eq!(entity, "Claim");
                assert_eq!(from, "COMPLETED");
                assert_eq!(to, "SUBMITTED");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_already_assessed_is_conflict() {
        let err: WorkflowError = ClaimError::AlreadyAssessed {
            claim_number: "CLM-1".into(),
            assessment_id: "TAS-1".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_retryable());
    }
}
