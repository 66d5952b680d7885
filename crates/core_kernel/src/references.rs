//! Human-readable business references
//!
//! Payments, claims and repair orders carry a reference such as
//! `PAY-1718000000000-0421`: a prefix, the creation time in epoch
//! milliseconds and a random disambiguator. References are not guaranteed
//! unique on their own; callers check the store and ask again on collision.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix for payment references
pub const PAYMENT_PREFIX: &str = "PAY";
/// Prefix for claim numbers
pub const CLAIM_PREFIX: &str = "CLM";
/// Prefix for repair order numbers
pub const REPAIR_ORDER_PREFIX: &str = "RO";

/// Produces candidate references
pub trait ReferenceGenerator: Send + Sync + 'static {
    fn generate(&self, prefix: &str, at: DateTime<Utc>) -> String;
}

/// `<prefix>-<epoch millis>-<4-digit random>`
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampReferenceGenerator;

impl ReferenceGenerator for TimestampReferenceGenerator {
    fn generate(&self, prefix: &str, at: DateTime<Utc>) -> String {
        let disambiguator = Uuid::new_v4().as_u128() % 10_000;
        format!("{}-{}-{:04}", prefix, at.timestamp_millis(), disambiguator)
    }
}
