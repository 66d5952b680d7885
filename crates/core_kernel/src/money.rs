//! Monetary amounts with precise decimal arithmetic
//!
//! The hub records premiums, payments and repair costs in a single unit of
//! account, so `Money` is a thin wrapper over `rust_decimal::Decimal` that
//! fixes the internal precision and offers the handful of operations the
//! lifecycle rules need (tolerance checks, sums, averages).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

/// Internal precision for stored amounts
const INTERNAL_DP: u32 = 4;

/// Precision used for display and reporting
const DISPLAY_DP: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// A monetary amount
///
/// Amounts are stored with 4 decimal places internally and displayed with 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp(INTERNAL_DP))
    }

    /// Creates a strictly positive amount, rejecting zero and negatives
    pub fn positive(amount: Decimal) -> Result<Self, MoneyError> {
        if amount > Decimal::ZERO {
            Ok(Self::new(amount))
        } else {
            Err(MoneyError::InvalidAmount(format!(
                "{} must be greater than zero",
                amount
            )))
        }
    }

    /// Creates Money from minor units (cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self::new(Decimal::new(minor_units, DISPLAY_DP))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self(dec!(0))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Rounds to two decimal places using banker's rounding
    pub fn rounded(&self) -> Self {
        Self(self.0.round_dp_with_strategy(
            DISPLAY_DP,
            rust_decimal::RoundingStrategy::MidpointNearestEven,
        ))
    }

    /// Absolute difference between two amounts
    pub fn distance(&self, other: &Money) -> Money {
        (*self - *other).abs()
    }

    /// Returns `rate` applied to this amount (e.g. 0.01 for one percent)
    pub fn fraction(&self, rate: Decimal) -> Money {
        Self::new(self.0 * rate)
    }

    /// Divides by a count, used for averages
    pub fn divide(&self, divisor: Decimal) -> Result<Self, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.0 / divisor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.dp$}", self.0, dp = DISPLAY_DP as usize)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Decimal {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        Self::new(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_arithmetic_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::from_minor(a);
            let mb = Money::from_minor(b);
            let mc = Money::from_minor(c);

            prop_assert_eq!((ma + mb) + mc, ma + (mb + mc));
        }

        #[test]
        fn distance_is_symmetric(a in 0i64..1_000_000i64, b in 0i64..1_000_000i64) {
            let ma = Money::from_minor(a);
            let mb = Money::from_minor(b);
            prop_assert_eq!(ma.distance(&mb), mb.distance(&ma));
        }
    }
}
