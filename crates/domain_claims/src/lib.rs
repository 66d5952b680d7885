//! Claims and Repairs Domain
//!
//! This crate models what happens after something goes wrong with a
//! protected asset: the claim itself, the technician's assessment and the
//! repair order sent to a provider.
//!
//! # Claim Lifecycle
//!
//! ```text
//! SUBMITTED -> UNDER_REVIEW -> APPROVED -> IN_REPAIR -> COMPLETED
//!     |             |  \________________/     |
//!     v             v                         v
//! REJECTED      REJECTED                  CANCELLED
//! ```
//!
//! # Repair Order Lifecycle
//!
//! ```text
//! PENDING -> DIAGNOSIS -> WAITING_PARTS -> IN_PROGRESS -> COMPLETED
//!    (any open state may be CANCELLED)
//! ```

pub mod claim;
pub mod assessment;
pub mod repair;
pub mod error;

pub use claim::{Claim, ClaimStatus, ClaimType, NewClaim};
pub use assessment::{AssessmentResult, NewAssessment, TechnicalAssessment};
pub use repair::{NewRepairOrder, RepairOrder, RepairOrderUpdate, RepairStatus};
pub use error::ClaimError;
