//! Repair orders
//!
//! A repair order tracks the physical repair of a claimed asset by an
//! outside provider. Each claim has at most one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{ClaimId, Money, RepairOrderId, StatusMachine};
use crate::error::ClaimError;

/// Repair order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    Pending,
    Diagnosis,
    WaitingParts,
    InProgress,
    Completed,
    Cancelled,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "PENDING",
            RepairStatus::Diagnosis => "DIAGNOSIS",
            RepairStatus::WaitingParts => "WAITING_PARTS",
            RepairStatus::InProgress => "IN_PROGRESS",
            RepairStatus::Completed => "COMPLETED",
            RepairStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusMachine for RepairStatus {
    const ENTITY: &'static str = "RepairOrder";

    fn all() -> &'static [Self] {
        use RepairStatus::*;
        &[Pending, Diagnosis, WaitingParts, InProgress, Completed, Cancelled]
    }

    fn successors(&self) -> &'static [Self] {
        use RepairStatus::*;
        match self {
            Pending => &[Diagnosis, Cancelled],
            Diagnosis => &[WaitingParts, InProgress, Cancelled],
            WaitingParts => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, RepairStatus::Completed | RepairStatus::Cancelled)
    }
}

/// Work order for repairing a claimed asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOrder {
    pub id: RepairOrderId,
    /// Business order number (`RO-...`)
    pub order_number: String,
    pub claim_id: ClaimId,
    pub provider_name: String,
    /// Provider e-mail
    pub provider_contact: Option<String>,
    pub provider_address: Option<String>,
    pub description: String,
    pub diagnosed_issue: Option<String>,
    pub parts_replaced: Option<String>,
    pub status: RepairStatus,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub actual_completion: Option<DateTime<Utc>>,
    pub estimated_cost: Option<Money>,
    /// Final cost, set on completion
    pub repair_cost: Option<Money>,
    pub warranty_days: Option<u32>,
    pub technician_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepairOrder {
    /// Builds a PENDING order from a request
    pub fn open(
        id: RepairOrderId,
        order_number: String,
        request: NewRepairOrder,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        request.validate()?;
        if request.provider_name.trim().is_empty() || request.description.trim().is_empty() {
            return Err(ClaimError::validation(
                "provider name and repair description are required",
            ));
        }
        ensure_future_estimate(request.estimated_completion, now)?;
        ensure_non_negative(request.estimated_cost, "estimated cost")?;

        Ok(Self {
            id,
            order_number,
            claim_id: request.claim_id,
            provider_name: request.provider_name,
            provider_contact: request.provider_contact,
            provider_address: request.provider_address,
            description: request.description,
            diagnosed_issue: request.diagnosed_issue,
            parts_replaced: None,
            status: RepairStatus::Pending,
            estimated_completion: request.estimated_completion,
            actual_completion: None,
            estimated_cost: request.estimated_cost,
            repair_cost: None,
            warranty_days: request.warranty_days,
            technician_notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the status; entering COMPLETED stamps the completion time
    pub fn update_status(&mut self, status: RepairStatus, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.status.ensure_transition(status)?;
        self.status = status;
        if status == RepairStatus::Completed && self.actual_completion.is_none() {
            self.actual_completion = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Closes the order with its final cost
    pub fn complete(
        &mut self,
        final_cost: Money,
        parts_replaced: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError> {
        ensure_non_negative(Some(final_cost), "repair cost")?;
        self.update_status(RepairStatus::Completed, now)?;
        self.actual_completion = Some(now);
        self.repair_cost = Some(final_cost);
        if parts_replaced.is_some() {
            self.parts_replaced = parts_replaced;
        }
        Ok(())
    }

    /// Cancels the order, keeping the reason in the technician notes
    pub fn cancel(&mut self, reason: Option<&str>, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.update_status(RepairStatus::Cancelled, now)?;
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            self.append_note(&format!("Cancellation: {}", reason));
        }
        Ok(())
    }

    /// Replaces the technician notes
    pub fn assign_technician(&mut self, notes: String, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.ensure_open()?;
        self.technician_notes = Some(notes);
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_details(&mut self, update: RepairOrderUpdate, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.ensure_open()?;
        update.validate()?;
        if update.provider_name.as_deref().is_some_and(|n| n.trim().is_empty())
            || update.description.as_deref().is_some_and(|d| d.trim().is_empty())
        {
            return Err(ClaimError::validation(
                "provider name and repair description must not be blank",
            ));
        }
        ensure_future_estimate(update.estimated_completion, now)?;
        ensure_non_negative(update.estimated_cost, "estimated cost")?;

        if let Some(v) = update.provider_name {
            self.provider_name = v;
        }
        if let Some(v) = update.provider_contact {
            self.provider_contact = Some(v);
        }
        if let Some(v) = update.provider_address {
            self.provider_address = Some(v);
        }
        if let Some(v) = update.description {
            self.description = v;
        }
        if let Some(v) = update.diagnosed_issue {
            self.diagnosed_issue = Some(v);
        }
        if let Some(v) = update.estimated_completion {
            self.estimated_completion = Some(v);
        }
        if let Some(v) = update.estimated_cost {
            self.estimated_cost = Some(v);
        }
        if let Some(v) = update.warranty_days {
            self.warranty_days = Some(v);
        }
        if let Some(v) = update.technician_notes {
            self.technician_notes = Some(v);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Past its estimate and still open
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal()
            && self.estimated_completion.is_some_and(|eta| now > eta)
    }

    /// Completed long ago and untouched since
    pub fn needs_follow_up(&self, now: DateTime<Utc>, after: Duration) -> bool {
        let cutoff = now - after;
        self.actual_completion.is_some_and(|done| done < cutoff) && self.updated_at < cutoff
    }

    /// Deletion is refused once work has started or finished
    pub fn is_deletable(&self) -> bool {
        !matches!(self.status, RepairStatus::Completed | RepairStatus::InProgress)
    }

    fn ensure_open(&self) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::Closed {
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn append_note(&mut self, line: &str) {
        self.technician_notes = Some(match self.technician_notes.take() {
            Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, line),
            _ => line.to_string(),
        });
    }
}

fn ensure_future_estimate(estimate: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), ClaimError> {
    match estimate {
        Some(eta) if eta <= now => Err(ClaimError::validation(format!(
            "estimated completion {} must be in the future",
            eta.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}

fn ensure_non_negative(amount: Option<Money>, what: &str) -> Result<(), ClaimError> {
    if amount.is_some_and(|a| a.is_negative()) {
        return Err(ClaimError::validation(format!("{} must not be negative", what)));
    }
    Ok(())
}

/// Request to open a repair order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewRepairOrder {
    pub claim_id: ClaimId,
    /// Supplied number, generated when absent
    #[validate(length(min = 1, max = 64))]
    pub order_number: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub provider_name: String,
    #[validate(email)]
    pub provider_contact: Option<String>,
    pub provider_address: Option<String>,
    #[validate(length(min = 1))]
    pub description: String,
    pub diagnosed_issue: Option<String>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub estimated_cost: Option<Money>,
    pub warranty_days: Option<u32>,
}

/// Editable repair order fields; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RepairOrderUpdate {
    #[validate(length(min = 1, max = 200))]
    pub provider_name: Option<String>,
    #[validate(email)]
    pub provider_contact: Option<String>,
    pub provider_address: Option<String>,
    pub description: Option<String>,
    pub diagnosed_issue: Option<String>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub estimated_cost: Option<Money>,
    pub warranty_days: Option<u32>,
    pub technician_notes: Option<String>,
}
