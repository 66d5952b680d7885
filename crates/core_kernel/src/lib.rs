//! Core Kernel - Foundational types shared by the protection hub crates
//!
//! This crate provides the building blocks every other crate depends on:
//! - Money with precise decimal arithmetic
//! - Coverage windows and an injectable clock
//! - Strongly-typed identifiers
//! - The status state machine contract
//! - Port vocabulary: errors, versioned records, the cache boundary
//! - Business reference generation

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod lifecycle;
pub mod ports;
pub mod cache;
pub mod references;
pub mod error;

pub use money::{Money, MoneyError};
pub use temporal::{add_months, Clock, CoverageWindow, FixedClock, SystemClock, TemporalError};
pub use identifiers::{
    AssessmentId, AssetId, ClaimId, CustomerId, PaymentId, PlanId, RepairOrderId,
};
pub use lifecycle::{ensure_transition, StatusMachine, TransitionError};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError, Versioned};
pub use cache::{CacheHint, CachePort, CacheRead, CacheScope, NoopCache};
pub use references::{ReferenceGenerator, TimestampReferenceGenerator};
pub use error::CoreError;
