//! Cache port
//!
//! The hub does not own a cache; it only promises to tell one what went
//! stale. Coordinators read through [`CachePort::lookup`] and, after every
//! successful commit, send one [`CacheHint`] per affected scope.
//!
//! A lookup also returns the generation of the entry. Filling the entry
//! after a miss only succeeds while that generation is still current, so a
//! value loaded before an invalidation can never land after it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ports::DomainPort;

/// Named cache regions, one per read shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheScope {
    Plan,
    Plans,
    CustomerPlans,
    Claim,
    Claims,
    PlanClaims,
    CustomerClaims,
    Assessment,
    Payment,
    Payments,
    PlanPayments,
    CustomerPayments,
    PaymentStats,
    RepairOrder,
    RepairOrders,
    ClaimRepairOrder,
    CustomerRepairOrders,
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheScope::Plan => "protectionPlan",
            CacheScope::Plans => "protectionPlans",
            CacheScope::CustomerPlans => "customerPlans",
            CacheScope::Claim => "claim",
            CacheScope::Claims => "claims",
            CacheScope::PlanClaims => "planClaims",
            CacheScope::CustomerClaims => "customerClaims",
            CacheScope::Assessment => "assessment",
            CacheScope::Payment => "payment",
            CacheScope::Payments => "payments",
            CacheScope::PlanPayments => "planPayments",
            CacheScope::CustomerPayments => "customerPayments",
            CacheScope::PaymentStats => "paymentStats",
            CacheScope::RepairOrder => "repairOrder",
            CacheScope::RepairOrders => "repairOrders",
            CacheScope::ClaimRepairOrder => "claimRepairOrders",
            CacheScope::CustomerRepairOrders => "customerRepairOrders",
        };
        f.write_str(name)
    }
}

/// Something in the cache that went stale
///
/// `key: None` drops every entry in the scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheHint {
    pub scope: CacheScope,
    pub key: Option<String>,
}

impl CacheHint {
    /// A single entry
    pub fn entry(scope: CacheScope, key: impl fmt::Display) -> Self {
        Self {
            scope,
            key: Some(key.to_string()),
        }
    }

    /// The whole scope
    pub fn all(scope: CacheScope) -> Self {
        Self { scope, key: None }
    }

    /// True if this hint covers the given entry
    pub fn covers(&self, scope: CacheScope, key: &str) -> bool {
        self.scope == scope && self.key.as_deref().map_or(true, |k| k == key)
    }
}

impl fmt::Display for CacheHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}::{}", self.scope, key),
            None => write!(f, "{}::*", self.scope),
        }
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheRead {
    pub value: Option<serde_json::Value>,
    /// Invalidation generation of the entry when it was read
    pub generation: u64,
}

impl CacheRead {
    pub fn miss(generation: u64) -> Self {
        Self {
            value: None,
            generation,
        }
    }

    pub fn hit(value: serde_json::Value, generation: u64) -> Self {
        Self {
            value: Some(value),
            generation,
        }
    }
}

/// Cache boundary used by the coordinators
///
/// Cache failures must never fail a business operation, so the port is
/// infallible; adapters log and swallow their own errors.
#[async_trait]
pub trait CachePort: DomainPort {
    async fn lookup(&self, scope: CacheScope, key: &str) -> CacheRead;

    /// Fills an entry unless it was invalidated after `generation` was read.
    /// Returns whether the value was kept.
    async fn store(&self, scope: CacheScope, key: &str, value: serde_json::Value, generation: u64) -> bool;

    async fn invalidate(&self, hint: &CacheHint);
}

/// A cache that never holds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl DomainPort for NoopCache {}

#[async_trait]
impl CachePort for NoopCache {
    async fn lookup(&self, _scope: CacheScope, _key: &str) -> CacheRead {
        CacheRead::miss(0)
    }

    async fn store(&self, _scope: CacheScope, _key: &str, _value: serde_json::Value, _generation: u64) -> bool {
        false
    }

    async fn invalidate(&self, _hint: &CacheHint) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_wide_hint_covers_every_key() {
        let hint = CacheHint::all(CacheScope::Payments);
        assert!(hint.covers(CacheScope::Payments, "anything"));
        assert!(!hint.covers(CacheScope::Payment, "anything"));
    }

    #[test]
    fn test_entry_hint_covers_only_its_key() {
        let hint = CacheHint::entry(CacheScope::Claim, "CLM-1");
        assert!(hint.covers(CacheScope::Claim, "CLM-1"));
        assert!(!hint.covers(CacheScope::Claim, "CLM-2"));
        assert_eq!(hint.to_string(), "claim::CLM-1");
    }

    #[tokio::test]
    async fn test_noop_cache_never_hits() {
        let cache = NoopCache;
        assert!(!cache.store(CacheScope::Plan, "k", serde_json::json!(1), 0).await);
        assert!(cache.lookup(CacheScope::Plan, "k").await.value.is_none());
    }
}
