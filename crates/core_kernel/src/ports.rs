//! Ports and Adapters Infrastructure
//!
//! Shared vocabulary for the hexagonal boundary between the workflow engine
//! and whatever stores its records.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Coordinators                             │
//! │          (plan, claim, payment, repair order)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Port Traits                             │
//! │            (WorkflowStore, CachePort, Clock)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │ In-memory adapter │     │ Database adapter │
//!         │  (ships with hub) │     │  (out of tree)   │
//!         └───────────────────┘     └──────────────────┘
//! ```
//!
//! Every stored record travels as a [`Versioned`] value. Adapters bump the
//! version on each successful write and reject writes whose expected version
//! is stale with [`PortError::VersionConflict`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for port operations
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A unique key is already taken by another record
    #[error("Duplicate {entity_type}: {key} '{value}' already exists")]
    Duplicate {
        entity_type: String,
        key: String,
        value: String,
    },

    /// The record changed since it was read
    #[error("Version conflict on {entity_type} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        entity_type: String,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Duplicate error for a unique key
    pub fn duplicate(
        entity_type: impl Into<String>,
        key: impl Into<String>,
        value: impl fmt::Display,
    ) -> Self {
        PortError::Duplicate {
            entity_type: entity_type.into(),
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// Creates a VersionConflict error
    pub fn version_conflict(
        entity_type: impl Into<String>,
        id: impl fmt::Display,
        expected: u64,
        actual: u64,
    ) -> Self {
        PortError::VersionConflict {
            entity_type: entity_type.into(),
            id: id.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true for unique-key and optimistic-lock failures
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            PortError::Duplicate { .. } | PortError::VersionConflict { .. }
        )
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// A stored record together with its optimistic-lock version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(record: T, version: u64) -> Self {
        Self { record, version }
    }

    pub fn into_inner(self) -> T {
        self.record
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            record: f(self.record),
            version: self.version,
        }
    }
}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Claim", "123");
        assert!(error.is_not_found());
        assert!(!error.is_conflict());
        assert!(error.to_string().contains("Claim"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_duplicate_and_version_conflict_are_conflicts() {
        assert!(PortError::duplicate("Payment", "payment_reference", "PAY-1").is_conflict());
        assert!(PortError::version_conflict("Plan", "PLN-1", 2, 3).is_conflict());
        assert!(!PortError::validation("bad").is_conflict());
    }

    #[test]
    fn test_port_error_transient() {
        assert!(PortError::connection("refused").is_transient());
        assert!(!PortError::internal("boom").is_transient());
    }

    #[test]
    fn test_versioned_map_keeps_version() {
        let v = Versioned::new(21, 4).map(|n| n * 2);
        assert_eq!(v, Versioned::new(42, 4));
    }
}
