//! Billing domain errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use core_kernel::{Money, TransitionError};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Paid amount outside the tolerance around the premium
    #[error("Payment amount {paid} does not match plan premium {premium}")]
    AmountMismatch { paid: Money, premium: Money },

    /// Refund requested for a payment that is not eligible
    #[error("Payment is not refundable: status {status}, paid on {payment_date}")]
    NotRefundable {
        status: String,
        payment_date: DateTime<Utc>,
    },

    /// Invalid input
    #[error("Invalid payment: {0}")]
    Validation(String),

    /// Terminal record
    #[error("Payment is {status} and can no longer be modified")]
    Closed { status: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BillingError::Validation(errors.to_string())
    }
}
