//! Workflow configuration

use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::CoreError;
use domain_billing::PaymentPolicy;

/// Tunables for the coordinators and maintenance jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Allowed relative deviation of a payment from the plan premium
    pub amount_tolerance: Decimal,
    /// Days after payment during which a refund is allowed
    pub refund_window_days: i64,
    /// Hours a payment may stay PENDING before the expiry job closes it
    pub pending_expiry_hours: i64,
    /// Months added to a plan reactivated by a completed payment
    pub billing_period_months: u32,
    /// Attempts at generating an unused business reference
    pub reference_attempts: u32,
    /// Daily run time (UTC) of the pending-payment expiry job
    pub payment_expiry_at: NaiveTime,
    /// Daily run time (UTC) of the overdue repair order report
    pub overdue_repairs_at: NaiveTime,
    /// Age after which a completed repair order needs a follow-up
    pub follow_up_days: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: dec!(0.01),
            refund_window_days: 30,
            pending_expiry_hours: 24,
            billing_period_months: 1,
            reference_attempts: 5,
            payment_expiry_at: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default(),
            overdue_repairs_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            follow_up_days: 30,
        }
    }
}

impl WorkflowConfig {
    /// Rejects values that would make the rules meaningless
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.amount_tolerance < Decimal::ZERO || self.amount_tolerance >= Decimal::ONE {
            return Err(CoreError::configuration(format!(
                "amount_tolerance must be in [0, 1), got {}",
                self.amount_tolerance
            )));
        }
        if self.refund_window_days < 0 {
            return Err(CoreError::configuration("refund_window_days must not be negative"));
        }
        if self.pending_expiry_hours <= 0 {
            return Err(CoreError::configuration("pending_expiry_hours must be positive"));
        }
        if self.billing_period_months == 0 {
            return Err(CoreError::configuration("billing_period_months must be at least 1"));
        }
        if self.reference_attempts == 0 {
            return Err(CoreError::configuration("reference_attempts must be at least 1"));
        }
        if self.follow_up_days < 0 {
            return Err(CoreError::configuration("follow_up_days must not be negative"));
        }
        Ok(())
    }

    pub fn payment_policy(&self) -> PaymentPolicy {
        PaymentPolicy {
            amount_tolerance: self.amount_tolerance,
            refund_window: Duration::days(self.refund_window_days),
            pending_expiry: Duration::hours(self.pending_expiry_hours),
        }
    }

    pub fn follow_up_after(&self) -> Duration {
        Duration::days(self.follow_up_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_payment_policy_defaults() {
        let config = WorkflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.payment_policy(), PaymentPolicy::default());
        assert_eq!(config.payment_expiry_at, NaiveTime::from_hms_opt(2, 0, 0).unwrap());
        assert_eq!(config.overdue_repairs_at, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: WorkflowConfig =
            serde_json::from_str(r#"{ "refund_window_days": 14 }"#).unwrap();
        assert_eq!(config.refund_window_days, 14);
        assert_eq!(config.pending_expiry_hours, 24);
    }

    #[test]
    fn test_zero_billing_period_rejected() {
        let config = WorkflowConfig {
            billing_period_months: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }
}
