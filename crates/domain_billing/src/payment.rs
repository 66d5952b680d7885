//! Premium payment records
//!
//! The hub records payments made against a coverage plan; it never moves
//! money itself. A record starts PENDING and is settled, failed, refunded or
//! expired through the transition table below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{Money, PaymentId, PlanId, StatusMachine};
use crate::error::BillingError;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    /// Brazilian instant payment
    Pix,
    DigitalWallet,
    Cash,
    Check,
    BankSlip,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::DigitalWallet => "DIGITAL_WALLET",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::BankSlip => "BANK_SLIP",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Recorded, awaiting settlement
    Pending,
    /// Settled
    Completed,
    /// Settlement failed, may be retried
    Failed,
    /// Returned to the payer
    Refunded,
    /// Withdrawn before settlement
    Cancelled,
    /// Reported by an upstream processor; no transitions out
    InProcess,
    /// Reported by an upstream processor; no transitions out
    PartiallyRefunded,
    /// Reversed by the card issuer
    Chargeback,
    /// Left pending too long
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::InProcess => "IN_PROCESS",
            PaymentStatus::PartiallyRefunded => "PARTIALLY_REFUNDED",
            PaymentStatus::Chargeback => "CHARGEBACK",
            PaymentStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusMachine for PaymentStatus {
    const ENTITY: &'static str = "PaymentRecord";

    fn all() -> &'static [Self] {
        use PaymentStatus::*;
        &[
            Pending,
            Completed,
            Failed,
            Refunded,
            Cancelled,
            InProcess,
            PartiallyRefunded,
            Chargeback,
            Expired,
        ]
    }

    fn successors(&self) -> &'static [Self] {
        use PaymentStatus::*;
        match self {
            Pending => &[Completed, Failed, Cancelled, Expired],
            Completed => &[Refunded, Chargeback],
            Failed => &[Pending],
            InProcess | PartiallyRefunded => &[],
            Refunded | Cancelled | Chargeback | Expired => &[],
        }
    }

    fn is_terminal(&self) -> bool {
        use PaymentStatus::*;
        matches!(self, Refunded | Cancelled | Chargeback | Expired)
    }
}

/// A premium payment recorded against a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Unique identifier
    pub id: PaymentId,
    /// Business reference (`PAY-...`), unique
    pub payment_reference: String,
    /// Plan being paid for
    pub plan_id: PlanId,
    /// Amount paid
    pub amount: Money,
    /// When the payment was made
    pub payment_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    /// Processor transaction id, unique when present
    pub transaction_id: Option<String>,
    pub payer_info: Option<String>,
    /// Free text; failure reasons are appended here
    pub payment_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Builds a record from a request whose status and date were resolved
    /// by the payment policy
    pub fn record(
        id: PaymentId,
        payment_reference: String,
        request: NewPayment,
        payment_date: DateTime<Utc>,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        request.validate()?;
        if !request.amount.is_positive() {
            return Err(BillingError::validation("payment amount must be greater than zero"));
        }

        Ok(Self {
            id,
            payment_reference,
            plan_id: request.plan_id,
            amount: request.amount,
            payment_date,
            payment_method: request.payment_method,
            status,
            transaction_id: request.transaction_id,
            payer_info: request.payer_info,
            payment_details: request.payment_details,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the status
    pub fn update_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.status.ensure_transition(status)?;
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// PENDING -> COMPLETED with the processor's transaction id
    pub fn mark_completed(&mut self, transaction_id: String, now: DateTime<Utc>) -> Result<(), BillingError> {
        if transaction_id.trim().is_empty() {
            return Err(BillingError::validation("transaction id must not be blank"));
        }
        self.update_status(PaymentStatus::Completed, now)?;
        self.transaction_id = Some(transaction_id);
        Ok(())
    }

    /// PENDING -> FAILED, keeping a non-blank reason in the details
    pub fn mark_failed(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.update_status(PaymentStatus::Failed, now)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Ok(());
        }
        let line = format!("Failure: {}", reason);
        self.payment_details = Some(match self.payment_details.take() {
            Some(details) if !details.is_empty() => format!("{}\n{}", details, line),
            _ => line,
        });
        Ok(())
    }

    pub fn apply_details(&mut self, update: PaymentDetailsUpdate, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.status.is_terminal() {
            return Err(BillingError::Closed {
                status: self.status.to_string(),
            });
        }
        update.validate()?;
        if let Some(payer) = update.payer_info {
            self.payer_info = Some(payer);
        }
        if let Some(details) = update.payment_details {
            self.payment_details = Some(details);
        }
        if let Some(tx) = update.transaction_id {
            self.transaction_id = Some(tx);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Only unsettled records may be physically removed
    pub fn is_deletable(&self) -> bool {
        matches!(self.status, PaymentStatus::Pending | PaymentStatus::Failed)
    }
}

/// Request to record a payment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPayment {
    pub plan_id: PlanId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    /// Supplied reference, generated when absent
    #[validate(length(min = 1, max = 64))]
    pub payment_reference: Option<String>,
    /// Defaults to the time of recording
    pub payment_date: Option<DateTime<Utc>>,
    /// Only PENDING is accepted; defaults to PENDING
    pub status: Option<PaymentStatus>,
    #[validate(length(min = 1, max = 128))]
    pub transaction_id: Option<String>,
    pub payer_info: Option<String>,
    pub payment_details: Option<String>,
}

/// Editable payment fields; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PaymentDetailsUpdate {
    pub payer_info: Option<String>,
    pub payment_details: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub transaction_id: Option<String>,
}
