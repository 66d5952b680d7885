//! Protection hub workflow engine
//!
//! Coordinates the lifecycles of coverage plans, claims, technical
//! assessments, payments and repair orders on top of two ports: a
//! [`WorkflowStore`](ports::WorkflowStore) for persistence and a
//! [`CachePort`](core_kernel::CachePort) for read caching.
//!
//! ```text
//!   caller ──► Workflow ──► {Plan,Claim,Payment,RepairOrder}Coordinator
//!                               │            │
//!                               │            └─► consistency rules (plan side effects)
//!                               ▼
//!                        WorkflowStore::commit(ChangeSet)  ──►  CachePort::invalidate
//!
//!   JobScheduler ──► JobRunner ──► PendingPaymentExpiryJob / OverdueRepairOrderJob
//! ```
//!
//! # Modules
//!
//! - [`coordinators`]: create, transition and query operations per entity
//! - [`consistency`]: payment-driven plan rules
//! - [`jobs`]: daily maintenance jobs and their scheduler
//! - [`ports`]: the store port, change sets and query filters
//! - [`adapters`]: in-memory store and cache

pub mod adapters;
pub mod config;
pub mod consistency;
pub mod coordinators;
pub mod error;
pub mod jobs;
pub mod ports;

pub use adapters::{InMemoryCache, InMemoryWorkflowStore};
pub use config::WorkflowConfig;
pub use coordinators::{
    ClaimCoordinator, PaymentCoordinator, PlanCoordinator, RepairOrderCoordinator, Workflow,
    WorkflowContext,
};
pub use error::{ErrorKind, WorkflowError, WorkflowResult};
pub use jobs::{
    DailySchedule, JobReport, JobRunner, JobScheduler, MaintenanceJob, OverdueRepairOrderJob,
    OverdueSink, PendingPaymentExpiryJob, TracingOverdueSink,
};
pub use ports::{
    Change, ChangeSet, ClaimQuery, PaymentQuery, PlanQuery, RepairOrderQuery, WorkflowStore, Write,
};
