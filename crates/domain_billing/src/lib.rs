//! Billing Domain
//!
//! Premium payments recorded against coverage plans, and the policy rules
//! that decide whether a payment is acceptable, refundable, retryable or
//! stale.
//!
//! # Payment Lifecycle
//!
//! ```text
//! PENDING ──► COMPLETED ──► REFUNDED | CHARGEBACK
//!    │  ▲
//!    │  └──── FAILED
//!    └──► FAILED | CANCELLED | EXPIRED
//! ```

pub mod payment;
pub mod policy;
pub mod statistics;
pub mod error;

pub use payment::{NewPayment, PaymentDetailsUpdate, PaymentMethod, PaymentRecord, PaymentStatus};
pub use policy::PaymentPolicy;
pub use statistics::{count_by_status, revenue_by_method, PaymentStatistics};
pub use error::BillingError;
