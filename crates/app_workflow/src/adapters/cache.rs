//! Process-local cache adapter

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use core_kernel::{CacheHint, CachePort, CacheRead, CacheScope, DomainPort};

type EntryKey = (CacheScope, String);

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<EntryKey, serde_json::Value>,
    /// Last invalidation touching a single entry
    entry_generations: HashMap<EntryKey, u64>,
    /// Last invalidation of a whole scope
    scope_generations: HashMap<CacheScope, u64>,
    /// Bumped by every invalidation
    counter: u64,
}

impl CacheState {
    fn generation(&self, key: &EntryKey) -> u64 {
        let entry = self.entry_generations.get(key).copied().unwrap_or(0);
        let scope = self.scope_generations.get(&key.0).copied().unwrap_or(0);
        entry.max(scope)
    }
}

/// Cache entries keyed by scope and entry key
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    state: Arc<RwLock<CacheState>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

impl DomainPort for InMemoryCache {}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn lookup(&self, scope: CacheScope, key: &str) -> CacheRead {
        let state = self.state.read().await;
        let key = (scope, key.to_string());
        let generation = state.generation(&key);
        match state.entries.get(&key) {
            Some(value) => CacheRead::hit(value.clone(), generation),
            None => CacheRead::miss(generation),
        }
    }

    async fn store(&self, scope: CacheScope, key: &str, value: serde_json::Value, generation: u64) -> bool {
        let mut state = self.state.write().await;
        let key = (scope, key.to_string());
        if state.generation(&key) != generation {
            tracing::trace!(%scope, key = %key.1, "cache fill skipped, entry invalidated since lookup");
            return false;
        }
        state.entries.insert(key, value);
        true
    }

    async fn invalidate(&self, hint: &CacheHint) {
        let mut state = self.state.write().await;
        state.counter += 1;
        let generation = state.counter;
        match &hint.key {
            Some(key) => {
                state
                    .entry_generations
                    .insert((hint.scope, key.clone()), generation);
            }
            None => {
                state.scope_generations.insert(hint.scope, generation);
                // the scope generation now dominates every entry generation
                state.entry_generations.retain(|(scope, _), _| *scope != hint.scope);
            }
        }
        state.entries.retain(|(scope, key), _| !hint.covers(*scope, key));
        tracing::trace!(hint = %hint, remaining = state.entries.len(), "cache invalidated");
    }
}
