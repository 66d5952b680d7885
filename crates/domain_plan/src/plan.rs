//! Coverage plan aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{AssetId, CoverageWindow, CustomerId, Money, PlanId, StatusMachine};
use crate::error::PlanError;

/// Coverage plan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// In force
    Active,
    /// Lapsed for non-payment, can be reactivated
    Inactive,
    /// Coverage window has ended
    Expired,
    /// Cancelled by the customer or the hub
    Cancelled,
    /// Suspended after a premium refund
    Suspended,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "ACTIVE",
            PlanStatus::Inactive => "INACTIVE",
            PlanStatus::Expired => "EXPIRED",
            PlanStatus::Cancelled => "CANCELLED",
            PlanStatus::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusMachine for PlanStatus {
    const ENTITY: &'static str = "CoveragePlan";

    fn all() -> &'static [Self] {
        use PlanStatus::*;
        &[Active, Inactive, Expired, Cancelled, Suspended]
    }

    fn successors(&self) -> &'static [Self] {
        use PlanStatus::*;
        match self {
            Active => &[Inactive, Cancelled, Expired],
            Inactive => &[Active, Cancelled],
            Expired => &[Active],
            Cancelled | Suspended => &[],
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Cancelled | PlanStatus::Suspended)
    }
}

/// A protection contract covering one asset for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePlan {
    /// Unique identifier
    pub id: PlanId,
    /// Plan name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Owning customer
    pub customer_id: CustomerId,
    /// Protected asset
    pub asset_id: AssetId,
    /// Coverage window
    pub window: CoverageWindow,
    /// Premium due per billing period
    pub premium: Money,
    /// Maximum payout
    pub coverage_limit: Money,
    /// Amount borne by the customer per claim
    pub deductible: Money,
    /// Status
    pub status: PlanStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl CoveragePlan {
    /// Builds a plan from a validated request
    ///
    /// The start date may not lie before `now`. The initial status defaults
    /// to ACTIVE; INACTIVE is accepted for plans sold ahead of first payment.
    pub fn open(id: PlanId, request: NewCoveragePlan, now: DateTime<Utc>) -> Result<Self, PlanError> {
        request.check()?;

        let window = CoverageWindow::new(request.start_date, request.end_date)?;
        if window.start < now {
            return Err(PlanError::validation(format!(
                "start date {} is in the past",
                window.start.to_rfc3339()
            )));
        }

        let status = match request.status {
            None | Some(PlanStatus::Active) => PlanStatus::Active,
            Some(PlanStatus::Inactive) => PlanStatus::Inactive,
            Some(other) => {
                return Err(PlanError::validation(format!(
                    "a new plan cannot start as {}",
                    other
                )))
            }
        };

        Ok(Self {
            id,
            name: request.name.trim().to_string(),
            description: request.description,
            customer_id: request.customer_id,
            asset_id: request.asset_id,
            window,
            premium: request.premium,
            coverage_limit: request.coverage_limit,
            deductible: request.deductible,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves to `next` if the transition table allows it
    pub fn transition_to(&mut self, next: PlanStatus, now: DateTime<Utc>) -> Result<(), PlanError> {
        self.status.ensure_transition(next)?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Cancels the plan; only an ACTIVE plan can be cancelled this way
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), PlanError> {
        if self.status != PlanStatus::Active {
            return Err(core_kernel::TransitionError::new(
                PlanStatus::ENTITY,
                self.status,
                PlanStatus::Cancelled,
            )
            .into());
        }
        self.transition_to(PlanStatus::Cancelled, now)
    }

    /// Extends the coverage window and puts the plan back in force
    ///
    /// Only ACTIVE and EXPIRED plans can be renewed.
    pub fn renew(&mut self, months: u32, now: DateTime<Utc>) -> Result<(), PlanError> {
        if months == 0 {
            return Err(PlanError::validation("renewal must be for at least one month"));
        }
        if !matches!(self.status, PlanStatus::Active | PlanStatus::Expired) {
            return Err(core_kernel::TransitionError::new(
                PlanStatus::ENTITY,
                self.status,
                PlanStatus::Active,
            )
            .into());
        }
        self.window = self.window.extend_months(months)?;
        self.status = PlanStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Applies editable fields; terminal plans are frozen
    pub fn apply_details(&mut self, update: PlanDetailsUpdate, now: DateTime<Utc>) -> Result<(), PlanError> {
        if self.status.is_terminal() {
            return Err(PlanError::Immutable {
                status: self.status.to_string(),
            });
        }
        update.check()?;

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(premium) = update.premium {
            self.premium = premium;
        }
        if let Some(limit) = update.coverage_limit {
            self.coverage_limit = limit;
        }
        if let Some(deductible) = update.deductible {
            self.deductible = deductible;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }
}

/// Request to open a coverage plan
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCoveragePlan {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub customer_id: CustomerId,
    pub asset_id: AssetId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub premium: Money,
    pub coverage_limit: Money,
    pub deductible: Money,
    /// Initial status, ACTIVE when absent
    pub status: Option<PlanStatus>,
}

impl NewCoveragePlan {
    fn check(&self) -> Result<(), PlanError> {
        self.validate()?;
        if self.name.trim().is_empty() {
            return Err(PlanError::validation("plan name must not be blank"));
        }
        check_amounts(Some(self.premium), Some(self.coverage_limit), Some(self.deductible))
    }
}

/// Editable plan fields; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PlanDetailsUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub premium: Option<Money>,
    pub coverage_limit: Option<Money>,
    pub deductible: Option<Money>,
}

impl PlanDetailsUpdate {
    fn check(&self) -> Result<(), PlanError> {
        self.validate()?;
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(PlanError::validation("plan name must not be blank"));
        }
        check_amounts(self.premium, self.coverage_limit, self.deductible)
    }
}

fn check_amounts(
    premium: Option<Money>,
    coverage_limit: Option<Money>,
    deductible: Option<Money>,
) -> Result<(), PlanError> {
    if premium.is_some_and(|p| p.amount() <= Decimal::ZERO) {
        return Err(PlanError::validation("premium must be greater than zero"));
    }
    if coverage_limit.is_some_and(|l| l.is_negative()) {
        return Err(PlanError::validation("coverage limit must not be negative"));
    }
    if deductible.is_some_and(|d| d.is_negative()) {
        return Err(PlanError::validation("deductible must not be negative"));
    }
    Ok(())
}
