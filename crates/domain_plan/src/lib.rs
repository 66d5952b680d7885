//! Coverage Plan Domain
//!
//! A coverage plan protects one customer asset over a time window in return
//! for a recurring premium.
//!
//! # Plan Lifecycle
//!
//! ```text
//! ACTIVE   ──► INACTIVE ──► ACTIVE
//! ACTIVE   ──► EXPIRED  ──► ACTIVE      (renewal)
//! ACTIVE   ──► CANCELLED
//! INACTIVE ──► CANCELLED
//! ```
//!
//! SUSPENDED is only reached through the refund rule in the workflow layer
//! and, like CANCELLED, is terminal.

pub mod plan;
pub mod error;

pub use plan::{CoveragePlan, NewCoveragePlan, PlanDetailsUpdate, PlanStatus};
pub use error::PlanError;
