//! Payment reporting

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::Money;
use crate::payment::{PaymentMethod, PaymentRecord, PaymentStatus};

/// Summary of one customer's payments
///
/// Totals and the average count COMPLETED payments only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatistics {
    pub total_paid: Money,
    pub completed_payments: u64,
    pub pending_payments: u64,
    pub average_payment: Money,
    pub last_payment_date: Option<DateTime<Utc>>,
}

impl PaymentStatistics {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PaymentRecord>) -> Self {
        let mut total_paid = Money::zero();
        let mut completed_payments = 0u64;
        let mut pending_payments = 0u64;
        let mut last_payment_date: Option<DateTime<Utc>> = None;

        for record in records {
            match record.status {
                PaymentStatus::Completed => {
                    total_paid = total_paid + record.amount;
                    completed_payments += 1;
                    last_payment_date = last_payment_date.max(Some(record.payment_date));
                }
                PaymentStatus::Pending => pending_payments += 1,
                _ => {}
            }
        }

        let average_payment = total_paid
            .divide(Decimal::from(completed_payments))
            .map(|average| average.rounded())
            .unwrap_or_else(|_| Money::zero());

        Self {
            total_paid,
            completed_payments,
            pending_payments,
            average_payment,
            last_payment_date,
        }
    }
}

/// Number of records in each status; statuses with no records are omitted
pub fn count_by_status<'a>(
    records: impl IntoIterator<Item = &'a PaymentRecord>,
) -> BTreeMap<PaymentStatus, u64> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.status).or_insert(0) += 1;
    }
    counts
}

/// Completed revenue per payment method
pub fn revenue_by_method<'a>(
    records: impl IntoIterator<Item = &'a PaymentRecord>,
) -> BTreeMap<PaymentMethod, Money> {
    let mut revenue = BTreeMap::new();
    for record in records.into_iter().filter(|r| r.status == PaymentStatus::Completed) {
        let slot = revenue.entry(record.payment_method).or_insert_with(Money::zero);
        *slot = *slot + record.amount;
    }
    revenue
}
