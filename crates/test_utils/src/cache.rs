//! Recording cache adapter
//!
//! Behaves like [`InMemoryCache`] and additionally keeps every
//! invalidation hint it receives so tests can assert on them.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use app_workflow::InMemoryCache;
use core_kernel::{CacheHint, CachePort, CacheRead, CacheScope, DomainPort};

#[derive(Debug, Default)]
pub struct RecordingCache {
    inner: InMemoryCache,
    hints: Mutex<Vec<CacheHint>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every hint received so far, in order
    pub fn invalidations(&self) -> Vec<CacheHint> {
        self.hints.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn clear_invalidations(&self) {
        if let Ok(mut hints) = self.hints.lock() {
            hints.clear();
        }
    }

    /// True if some received hint covers the given entry
    pub fn was_invalidated(&self, scope: CacheScope, key: &str) -> bool {
        self.invalidations().iter().any(|h| h.covers(scope, key))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::SeqCst)
    }
}

impl DomainPort for RecordingCache {}

#[async_trait]
impl CachePort for RecordingCache {
    async fn lookup(&self, scope: CacheScope, key: &str) -> CacheRead {
        let found = self.inner.lookup(scope, key).await;
        let counter = if found.value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::SeqCst);
        found
    }

    async fn store(&self, scope: CacheScope, key: &str, value: serde_json::Value, generation: u64) -> bool {
        self.inner.store(scope, key, value, generation).await
    }

    async fn invalidate(&self, hint: &CacheHint) {
        if let Ok(mut hints) = self.hints.lock() {
            hints.push(hint.clone());
        }
        self.inner.invalidate(hint).await;
    }
}
