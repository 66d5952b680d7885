//! Adapters shipped with the engine

pub mod cache;
pub mod in_memory;

pub use cache::InMemoryCache;
pub use in_memory::{InMemoryWorkflowStore, StoreCounts};
