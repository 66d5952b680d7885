//! Payment policy engine
//!
//! Pure rules about payments that do not need the store:
//!
//! - amount check: `|paid - premium| <= premium * tolerance`
//! - refund window: COMPLETED and paid no earlier than `now - window`
//! - retry: FAILED or PENDING
//! - staleness: PENDING and paid strictly before `now - pending_expiry`
//! - defaults: missing status becomes PENDING, missing date becomes now

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::Money;
use crate::error::BillingError;
use crate::payment::{PaymentRecord, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPolicy {
    /// Allowed relative deviation from the premium (0.01 = 1%)
    pub amount_tolerance: Decimal,
    /// How long after payment a refund is still allowed
    pub refund_window: Duration,
    /// How long a payment may stay PENDING
    pub pending_expiry: Duration,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            amount_tolerance: dec!(0.01),
            refund_window: Duration::days(30),
            pending_expiry: Duration::hours(24),
        }
    }
}

impl PaymentPolicy {
    /// Checks the paid amount against the plan premium
    pub fn validate_amount(&self, paid: Money, premium: Money) -> Result<(), BillingError> {
        let allowed = premium.fraction(self.amount_tolerance).abs();
        if paid.distance(&premium) > allowed {
            return Err(BillingError::AmountMismatch { paid, premium });
        }
        Ok(())
    }

    /// Resolves the initial status; only PENDING may be supplied
    pub fn initial_status(&self, requested: Option<PaymentStatus>) -> Result<PaymentStatus, BillingError> {
        match requested {
            None | Some(PaymentStatus::Pending) => Ok(PaymentStatus::Pending),
            Some(other) => Err(BillingError::validation(format!(
                "a new payment cannot start as {}",
                other
            ))),
        }
    }

    pub fn is_refundable(&self, payment: &PaymentRecord, now: DateTime<Utc>) -> bool {
        payment.status == PaymentStatus::Completed
            && now - self.refund_window <= payment.payment_date
    }

    pub fn ensure_refundable(&self, payment: &PaymentRecord, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.is_refundable(payment, now) {
            Ok(())
        } else {
            Err(BillingError::NotRefundable {
                status: payment.status.to_string(),
                payment_date: payment.payment_date,
            })
        }
    }

    pub fn can_retry(&self, payment: &PaymentRecord) -> bool {
        matches!(payment.status, PaymentStatus::Failed | PaymentStatus::Pending)
    }

    pub fn is_stale_pending(&self, payment: &PaymentRecord, now: DateTime<Utc>) -> bool {
        payment.status == PaymentStatus::Pending && payment.payment_date < now - self.pending_expiry
    }

    /// Oldest payment date that is still fresh
    pub fn pending_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.pending_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let policy = PaymentPolicy::default();
        let premium = Money::new(dec!(100.00));
        assert!(policy.validate_amount(Money::new(dec!(101.00)), premium).is_ok());
        assert!(policy.validate_amount(Money::new(dec!(99.00)), premium).is_ok());
        assert!(policy.validate_amount(Money::new(dec!(101.01)), premium).is_err());
    }

    #[test]
    fn test_zero_tolerance_requires_exact_amount() {
        let policy = PaymentPolicy {
            amount_tolerance: Decimal::ZERO,
            ..Default::default()
        };
        let premium = Money::new(dec!(50));
        assert!(policy.validate_amount(premium, premium).is_ok());
        assert!(policy.validate_amount(Money::new(dec!(50.01)), premium).is_err());
    }

    #[test]
    fn test_initial_status_only_pending() {
        let policy = PaymentPolicy::default();
        assert_eq!(policy.initial_status(None).unwrap(), PaymentStatus::Pending);
        assert!(policy.initial_status(Some(PaymentStatus::Completed)).is_err());
    }
}
