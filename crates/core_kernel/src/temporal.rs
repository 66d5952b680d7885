//! Time handling for coverage windows and the injectable clock
//!
//! Coordinators never call `Utc::now()` directly. They read the time from a
//! [`Clock`] so that lifecycle rules depending on "now" (plan start dates,
//! refund windows, pending-payment expiry, overdue repairs) can be driven
//! deterministically in tests with a [`FixedClock`].

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} must not be after end {end}")]
    InvalidWindow {
        start: String,
        end: String,
    },

    #[error("Date arithmetic overflowed adding {months} months to {date}")]
    Overflow {
        date: String,
        months: u32,
    },
}

/// The period a coverage plan protects its asset
///
/// Both bounds are inclusive; a window may be a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CoverageWindow {
    /// Creates a window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Returns true once `at` is past the end of the window
    pub fn has_ended(&self, at: DateTime<Utc>) -> bool {
        self.end < at
    }

    /// Pushes the end out by calendar months, clamping to the last day of
    /// shorter months (Jan 31 + 1 month = Feb 28/29)
    pub fn extend_months(&self, months: u32) -> Result<Self, TemporalError> {
        let end = add_months(self.end, months)?;
        Ok(Self { start: self.start, end })
    }
}

/// Adds calendar months to a timestamp
pub fn add_months(at: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, TemporalError> {
    at.checked_add_months(Months::new(months))
        .ok_or_else(|| TemporalError::Overflow {
            date: at.to_rfc3339(),
            months,
        })
}

/// Source of the current time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Stores microseconds since the epoch so it can be shared across tasks
/// without a lock.
#[derive(Debug)]
pub struct FixedClock {
    micros: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            micros: AtomicI64::new(at.timestamp_micros()),
        }
    }

    /// Moves the clock to an absolute instant
    pub fn set(&self, at: DateTime<Utc>) {
        self.micros.store(at.timestamp_micros(), Ordering::SeqCst);
    }

    /// Moves the clock forward (or backward for negative durations)
    pub fn advance(&self, by: Duration) {
        let delta = by.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = self.micros.load(Ordering::SeqCst);
        DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
