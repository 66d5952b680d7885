//! Coverage plan domain errors

use thiserror::Error;

use core_kernel::{TemporalError, TransitionError};

/// Errors that can occur in the plan domain
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid plan: {0}")]
    Validation(String),

    #[error("Plan is {status} and can no longer be modified")]
    Immutable { status: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Coverage window error: {0}")]
    Window(#[from] TemporalError),
}

impl PlanError {
    pub fn validation(message: impl Into<String>) -> Self {
        PlanError::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for PlanError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PlanError::Validation(errors.to_string())
    }
}
