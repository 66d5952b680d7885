//! Pre-built Test Fixtures
//!
//! Fixed amounts and instants shared by the test suites. Every harness
//! clock starts at [`TemporalFixtures::now`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::Money;
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard monthly premium
    pub fn premium() -> Money {
        Money::new(dec!(100.00))
    }

    /// Coverage limit of a mid-range device plan
    pub fn coverage_limit() -> Money {
        Money::new(dec!(2500.00))
    }

    pub fn deductible() -> Money {
        Money::new(dec!(50.00))
    }

    /// Just inside the 1% tolerance around [`MoneyFixtures::premium`]
    pub fn within_tolerance() -> Money {
        Money::new(dec!(100.99))
    }

    /// Outside the 1% tolerance around [`MoneyFixtures::premium`]
    pub fn outside_tolerance() -> Money {
        Money::new(dec!(102.00))
    }

    pub fn repair_estimate() -> Money {
        Money::new(dec!(180.00))
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The instant every test clock starts at (Jan 15, 2025 10:00 UTC)
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// End of a one-year plan starting at [`TemporalFixtures::now`]
    pub fn plan_end() -> DateTime<Utc> {
        Self::now() + Duration::days(365)
    }

    pub fn hours_ago(hours: i64) -> DateTime<Utc> {
        Self::now() - Duration::hours(hours)
    }

    pub fn days_ago(days: i64) -> DateTime<Utc> {
        Self::now() - Duration::days(days)
    }

    pub fn days_ahead(days: i64) -> DateTime<Utc> {
        Self::now() + Duration::days(days)
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn plan_name() -> &'static str {
        "Smartphone Protection Plus"
    }

    pub fn provider_name() -> &'static str {
        "FixIt Electronics"
    }

    pub fn provider_email() -> &'static str {
        "service@fixit.example"
    }

    pub fn assessor_name() -> &'static str {
        "R. Tanaka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_now_is_fixed() {
        assert_eq!(TemporalFixtures::now(), TemporalFixtures::now());
        assert!(TemporalFixtures::plan_end() > TemporalFixtures::now());
    }

    #[test]
    fn test_tolerance_fixtures_straddle_premium() {
        assert!(MoneyFixtures::within_tolerance() > MoneyFixtures::premium());
        assert!(MoneyFixtures::outside_tolerance() > MoneyFixtures::within_tolerance());
    }
}
