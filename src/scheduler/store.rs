// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cache storage for the refresh scheduler
//!
//! The store is injected into the [`RefreshScheduler`](super::RefreshScheduler)
//! rather than living in a global. Entries are replaced whole on every
//! successful refresh, so readers never see a partially updated value.
//! Entries are never evicted: the key set is bounded by the distinct queries
//! a process actually makes.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::query::{ChainScope, LogicalQuery};

/// Key of one cache entry: what is fetched and from which chains
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub(crate) query: LogicalQuery,
    pub(crate) scope: ChainScope,
}

impl CacheKey {
    /// Creates a new cache key
    pub fn new(query: LogicalQuery, scope: ChainScope) -> Self {
        Self { query, scope }
    }

    /// The logical query
    pub fn query(&self) -> &LogicalQuery {
        &self.query
    }

    /// The chain scope
    pub fn scope(&self) -> &ChainScope {
        &self.scope
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.query, self.scope)
    }
}

/// One cached aggregation result
///
/// `value` holds an `AggregateResult<T>` for the record type of the query
/// that produced it; [`CacheEntry::value_as`] recovers it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The key this entry belongs to
    pub key: CacheKey,
    /// The cached value
    pub value: Arc<dyn Any + Send + Sync>,
    /// When the value was fetched
    pub fetched_at: Instant,
    /// Age after which the value is stale
    pub stale_after: Duration,
    /// Background refresh period
    pub refresh_interval: Duration,
}

impl CacheEntry {
    /// Age of the value at `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Whether the value is stale at `now`
    pub fn is_stale(&self, now: Instant) -> bool {
        self.age(now) >= self.stale_after
    }

    /// The value, if it has type `T`
    pub fn value_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits (successful retrievals)
    pub hits: u64,
    /// Number of cache misses (key not found)
    pub misses: u64,
    /// Number of times an entry was written
    pub writes: u64,
    /// Current number of entries in the cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, writes={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.writes,
            self.entries,
            self.hit_rate()
        )
    }
}

/// Trait for scheduler cache backends
///
/// Implementations must be thread-safe and replace entries atomically.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Retrieves the entry for the given key
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Inserts or replaces the entry for its key
    async fn insert(&self, entry: CacheEntry);

    /// Returns current cache statistics
    async fn stats(&self) -> CacheStats;

    /// Returns a human-readable name for this cache backend
    fn name(&self) -> &'static str;
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
}

/// Unbounded in-memory [`CacheStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryStoreState>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut state = self.state.lock().await;
        let entry = state.entries.get(key).cloned();
        if entry.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        entry
    }

    async fn insert(&self, entry: CacheEntry) {
        let mut state = self.state.lock().await;
        debug!(key = %entry.key, "Storing cache entry");
        state.entries.insert(entry.key.clone(), entry);
        state.stats.writes += 1;
        state.stats.entries = state.entries.len();
    }

    async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            ..state.stats.clone()
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
