//! Claims domain errors

use thiserror::Error;

use core_kernel::TransitionError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invalid claim data: {0}")]
    Validation(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Record is {status} and can no longer be modified")]
    Closed { status: String },

    #[error("Claim {claim_number} already has assessment {assessment_id}")]
    AlreadyAssessed {
        claim_number: String,
        assessment_id: String,
    },
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for ClaimError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ClaimError::Validation(errors.to_string())
    }
}
