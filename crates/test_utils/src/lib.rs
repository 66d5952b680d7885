//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! protection hub test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data and fixed instants
//! - `builders`: Builders for creation requests with sensible defaults
//! - `harness`: A fully wired workflow over in-memory adapters and a fixed clock
//! - `cache`: A cache adapter that records invalidation hints
//! - `store`: A store wrapper that fails selected commits
//! - `assertions`: Custom assertion helpers for workflow results
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod cache;
pub mod store;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use cache::*;
pub use store::*;
pub use assertions::*;
pub use generators::*;
