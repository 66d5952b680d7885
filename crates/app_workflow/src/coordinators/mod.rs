//! Entity lifecycle coordinators
//!
//! Each coordinator owns the create/transition/read operations of one
//! entity. They share a [`WorkflowContext`] holding the ports and the
//! configuration. Every mutation ends in exactly one
//! [`WorkflowStore::commit`], followed by cache invalidation once the commit
//! succeeded.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_kernel::{
    CacheHint, CachePort, CacheScope, Clock, NoopCache, ReferenceGenerator,
    TimestampReferenceGenerator,
};
use domain_billing::PaymentPolicy;

use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::ports::{ChangeSet, WorkflowStore};

pub mod claim;
pub mod payment;
pub mod plan;
pub mod repair;

pub use claim::ClaimCoordinator;
pub use payment::PaymentCoordinator;
pub use plan::PlanCoordinator;
pub use repair::RepairOrderCoordinator;

/// Ports and settings shared by every coordinator
pub struct WorkflowContext {
    store: Arc<dyn WorkflowStore>,
    cache: Arc<dyn CachePort>,
    clock: Arc<dyn Clock>,
    references: Arc<dyn ReferenceGenerator>,
    config: WorkflowConfig,
    policy: PaymentPolicy,
}

impl WorkflowContext {
    /// Creates a context with no cache, timestamp references and default
    /// configuration
    pub fn new(store: Arc<dyn WorkflowStore>, clock: Arc<dyn Clock>) -> Self {
        let config = WorkflowConfig::default();
        Self {
            store,
            cache: Arc::new(NoopCache),
            clock,
            references: Arc::new(TimestampReferenceGenerator),
            policy: config.payment_policy(),
            config,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CachePort>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceGenerator>) -> Self {
        self.references = references;
        self
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.policy = config.payment_policy();
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<dyn CachePort> {
        &self.cache
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn policy(&self) -> &PaymentPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Commits the change set, then drops the stale cache entries
    ///
    /// Nothing is invalidated when the commit fails.
    pub async fn commit(&self, changes: ChangeSet, hints: Vec<CacheHint>) -> WorkflowResult<()> {
        self.store.commit(changes).await?;
        for hint in &hints {
            self.cache.invalidate(hint).await;
        }
        Ok(())
    }

    /// Read-through cache lookup
    ///
    /// An entry that no longer decodes is treated as a miss and overwritten.
    /// The loaded value is only cached if the entry was not invalidated
    /// while it was being loaded.
    pub async fn cached<T, F, Fut>(&self, scope: CacheScope, key: &str, load: F) -> WorkflowResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = WorkflowResult<T>>,
    {
        let read = self.cache.lookup(scope, key).await;
        if let Some(value) = read.value {
            match serde_json::from_value::<T>(value) {
                Ok(hit) => return Ok(hit),
                Err(e) => tracing::debug!(%scope, key, error = %e, "discarding undecodable cache entry"),
            }
        }

        let loaded = load().await?;
        match serde_json::to_value(&loaded) {
            Ok(value) => {
                if !self.cache.store(scope, key, value, read.generation).await {
                    tracing::debug!(%scope, key, "loaded value went stale before caching");
                }
            }
            Err(e) => tracing::warn!(%scope, key, error = %e, "value not cacheable"),
        }
        Ok(loaded)
    }

    /// Resolves the business reference of a new record
    ///
    /// A supplied reference must be unused. Otherwise candidates are drawn
    /// from the generator until an unused one turns up, at most
    /// `reference_attempts` times.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Reference prefix, e.g. `PAY`
    /// * `supplied` - Reference given by the caller, if any
    /// * `exists` - Asks the store whether a candidate is taken
    pub async fn unique_reference<F, Fut>(
        &self,
        prefix: &str,
        supplied: Option<String>,
        exists: F,
    ) -> WorkflowResult<String>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = WorkflowResult<bool>>,
    {
        if let Some(reference) = supplied {
            if exists(reference.clone()).await? {
                return Err(WorkflowError::conflict(format!(
                    "reference {} already exists",
                    reference
                )));
            }
            return Ok(reference);
        }

        for _ in 0..self.config.reference_attempts {
            let candidate = self.references.generate(prefix, self.now());
            if !exists(candidate.clone()).await? {
                return Ok(candidate);
            }
            tracing::debug!(prefix, candidate = %candidate, "generated reference already taken");
        }
        Err(WorkflowError::conflict(format!(
            "could not generate an unused {} reference after {} attempts",
            prefix, self.config.reference_attempts
        )))
    }
}

/// Entry point bundling the four coordinators over one context
#[derive(Clone)]
pub struct Workflow {
    ctx: Arc<WorkflowContext>,
}

impl Workflow {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &Arc<WorkflowContext> {
        &self.ctx
    }

    pub fn plans(&self) -> PlanCoordinator {
        PlanCoordinator::new(self.ctx.clone())
    }

    pub fn claims(&self) -> ClaimCoordinator {
        ClaimCoordinator::new(self.ctx.clone())
    }

    pub fn payments(&self) -> PaymentCoordinator {
        PaymentCoordinator::new(self.ctx.clone())
    }

    pub fn repairs(&self) -> RepairOrderCoordinator {
        RepairOrderCoordinator::new(self.ctx.clone())
    }
}
