// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Refresh scheduler: cache freshness per logical query
//!
//! Every cache key (a [`LogicalQuery`] plus its [`ChainScope`]) moves through
//! four states:
//!
//! ```text
//! Empty ──read──▶ Refreshing ──done──▶ Fresh ──stale_after──▶ Stale ──read──▶ Refreshing
//! ```
//!
//! - A read of an `Empty` or `Stale` key starts a background aggregation and
//!   returns immediately with the last known value, if any.
//! - At most one aggregation per key is in flight. Reads and refetches issued
//!   meanwhile join it instead of starting another.
//! - A failed refresh never clears data; the failure is exposed on
//!   [`QueryState::error`] until the next success.
//! - Subscribed keys are also refreshed every `refresh_interval`, unless the
//!   view is hidden and the kind is not marked always-live. When the view
//!   becomes visible again, stale subscribed keys refresh immediately.
//!
//! # Example
//!
//! ```rust,ignore
//! use multiscan::{ChainScope, PoolsQuery, RefreshScheduler};
//!
//! let scheduler = RefreshScheduler::with_memory_store(aggregator, &config);
//! let pools = scheduler.handle(PoolsQuery::new(), ChainScope::All);
//!
//! let _subscription = pools.subscribe();
//! let state = pools.fetch().await;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};

use crate::aggregate::{AggregateResult, Aggregator};
use crate::config::{MultiscanConfig, RefreshPolicy};
use crate::errors::AggregateError;
use crate::executor::ChainQuery;
use crate::query::{ChainScope, LogicalQuery};
use crate::spans;

mod store;
mod subscription;

pub use store::{CacheEntry, CacheKey, CacheStats, CacheStore, MemoryStore};
pub use subscription::Subscription;

type InFlight = Shared<BoxFuture<'static, ()>>;

/// Freshness of one cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Never fetched successfully and nothing in flight
    Empty,
    /// Fetched within `stale_after`
    Fresh,
    /// Fetched longer than `stale_after` ago, still served
    Stale,
    /// An aggregation is in flight
    Refreshing,
}

/// What a consumer sees for one query
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Last successful result; `None` only before the first success
    pub data: Option<Arc<AggregateResult<T>>>,
    /// Freshness of the key
    pub state: CacheState,
    /// In flight with no data to show yet
    pub is_loading: bool,
    /// In flight, whether or not data exists
    pub is_fetching: bool,
    /// Last failure of a single-chain query, cleared by the next success
    pub error: Option<Arc<AggregateError>>,
    /// When `data` was fetched
    pub fetched_at: Option<Instant>,
}

struct SchedulerInner {
    aggregator: Aggregator,
    store: Arc<dyn CacheStore>,
    config: MultiscanConfig,
    in_flight: Mutex<HashMap<CacheKey, InFlight>>,
    errors: Mutex<HashMap<CacheKey, Arc<AggregateError>>>,
    visible: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SchedulerInner {
    fn policy(&self, query: &LogicalQuery) -> RefreshPolicy {
        self.config.refresh_policy(query.kind())
    }

    fn is_in_flight(&self, key: &CacheKey) -> bool {
        lock(&self.in_flight).contains_key(key)
    }

    /// Start an aggregation for `key` unless one is already running
    fn trigger<Q: ChainQuery>(
        self: &Arc<Self>,
        key: &CacheKey,
        query: &Arc<Q>,
    ) -> InFlight {
        let mut in_flight = lock(&self.in_flight);
        if let Some(running) = in_flight.get(key) {
            debug!(key = %key, "Joining in-flight refresh");
            return running.clone();
        }

        let refresh = Arc::clone(self)
            .refresh(key.clone(), Arc::clone(query))
            .boxed()
            .shared();
        in_flight.insert(key.clone(), refresh.clone());
        drop(in_flight);

        // Readers do not have to await the refresh for it to complete
        tokio::spawn(refresh.clone());
        refresh
    }

    async fn refresh<Q: ChainQuery>(self: Arc<Self>, key: CacheKey, query: Arc<Q>) {
        let span = spans::refresh(&key.query, &key.scope);

        async {
            match self.aggregator.aggregate(query.as_ref(), &key.scope).await {
                Ok(result) => {
                    let policy = self.policy(&key.query);
                    self.store
                        .insert(CacheEntry {
                            key: key.clone(),
                            value: Arc::new(result),
                            fetched_at: Instant::now(),
                            stale_after: policy.stale_after,
                            refresh_interval: policy.refresh_interval,
                        })
                        .await;
                    lock(&self.errors).remove(&key);
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "Refresh failed, keeping last value");
                    lock(&self.errors).insert(key.clone(), Arc::new(error));
                }
            }

            lock(&self.in_flight).remove(&key);
        }
        .instrument(span)
        .await
    }

    async fn state<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> QueryState<T> {
        // A refresh stores its result before leaving the in-flight table, so
        // sampling the table first never misses both.
        let fetching = self.is_in_flight(key);
        let entry = self.store.get(key).await;
        self.state_from(key, fetching, entry.as_ref())
    }

    fn state_from<T: Clone + Send + Sync + 'static>(
        &self,
        key: &CacheKey,
        fetching: bool,
        entry: Option<&CacheEntry>,
    ) -> QueryState<T> {
        let data = entry.and_then(CacheEntry::value_as::<AggregateResult<T>>);

        let state = match (fetching, entry) {
            (true, _) => CacheState::Refreshing,
            (false, None) => CacheState::Empty,
            (false, Some(entry)) if entry.is_stale(Instant::now()) => CacheState::Stale,
            (false, Some(_)) => CacheState::Fresh,
        };

        QueryState {
            is_loading: fetching && data.is_none(),
            is_fetching: fetching,
            error: lock(&self.errors).get(key).cloned(),
            fetched_at: entry.map(|entry| entry.fetched_at),
            data,
            state,
        }
    }

    async fn needs_refresh(&self, key: &CacheKey) -> bool {
        match self.store.get(key).await {
            Some(entry) => entry.is_stale(Instant::now()),
            None => true,
        }
    }
}

/// Owns the cache and decides when to re-run aggregations
///
/// Cheap to clone; clones share the cache, the in-flight table and the
/// visibility flag.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("store", &self.inner.store.name())
            .field("visible", &*self.inner.visible.borrow())
            .finish_non_exhaustive()
    }
}

impl RefreshScheduler {
    /// Create a scheduler over an injected store
    ///
    /// Refresh policies come from `config`; the view starts out visible.
    pub fn new(aggregator: Aggregator, store: Arc<dyn CacheStore>, config: &MultiscanConfig) -> Self {
        let (visible, _) = watch::channel(true);
        Self {
            inner: Arc::new(SchedulerInner {
                aggregator,
                store,
                config: config.clone(),
                in_flight: Mutex::new(HashMap::new()),
                errors: Mutex::new(HashMap::new()),
                visible,
            }),
        }
    }

    /// Create a scheduler with an unbounded [`MemoryStore`]
    pub fn with_memory_store(aggregator: Aggregator, config: &MultiscanConfig) -> Self {
        Self::new(aggregator, Arc::new(MemoryStore::new()), config)
    }

    /// Bind a query to this scheduler
    pub fn handle<Q: ChainQuery>(&self, query: Q, scope: ChainScope) -> QueryHandle<Q> {
        let key = CacheKey::new(query.logical_query(), scope);
        QueryHandle {
            scheduler: self.clone(),
            query: Arc::new(query),
            key,
        }
    }

    /// Mark the consuming view visible or hidden
    ///
    /// While hidden, periodic refreshes are skipped for kinds that are not
    /// always-live. Becoming visible refreshes stale subscribed keys.
    pub fn set_visible(&self, visible: bool) {
        let changed = self.inner.visible.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
        if changed {
            debug!(visible, "View visibility changed");
        }
    }

    /// Whether the consuming view is visible
    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Number of aggregations currently in flight
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }

    /// Statistics of the underlying store
    pub async fn stats(&self) -> CacheStats {
        self.inner.store.stats().await
    }

    /// The refresh policy applied to a query
    pub fn policy(&self, query: &LogicalQuery) -> RefreshPolicy {
        self.inner.policy(query)
    }
}

/// A query bound to a scheduler: the consumer-facing read surface
pub struct QueryHandle<Q: ChainQuery> {
    scheduler: RefreshScheduler,
    query: Arc<Q>,
    key: CacheKey,
}

impl<Q: ChainQuery> Clone for QueryHandle<Q> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            query: Arc::clone(&self.query),
            key: self.key.clone(),
        }
    }
}

impl<Q: ChainQuery> std::fmt::Debug for QueryHandle<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHandle").field("key", &self.key).finish()
    }
}

impl<Q: ChainQuery> QueryHandle<Q> {
    /// The cache key
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Current state, starting a background refresh if the key is empty or stale
    ///
    /// Never waits for the network.
    pub async fn read(&self) -> QueryState<Q::Record> {
        let inner = &self.scheduler.inner;
        if inner.needs_refresh(&self.key).await {
            self.trigger();
        }
        inner.state(&self.key).await
    }

    /// Like [`read`](Self::read), but waits for the refresh it starts or joins
    pub async fn fetch(&self) -> QueryState<Q::Record> {
        let inner = &self.scheduler.inner;
        if inner.needs_refresh(&self.key).await || inner.is_in_flight(&self.key) {
            self.trigger().await;
        }
        inner.state(&self.key).await
    }

    /// Refresh regardless of staleness and wait for it
    ///
    /// Joins the in-flight refresh if there is one.
    pub async fn refetch(&self) -> QueryState<Q::Record> {
        self.trigger().await;
        self.scheduler.inner.state(&self.key).await
    }

    /// Current state without triggering anything
    pub async fn state(&self) -> QueryState<Q::Record> {
        self.scheduler.inner.state(&self.key).await
    }

    /// Keep this key refreshed in the background until the returned guard drops
    pub fn subscribe(&self) -> Subscription {
        Subscription::spawn(self.clone())
    }

    fn trigger(&self) -> InFlight {
        self.scheduler.inner.trigger(&self.key, &self.query)
    }

    pub(crate) fn policy(&self) -> RefreshPolicy {
        self.scheduler.inner.policy(&self.key.query)
    }

    pub(crate) fn visibility(&self) -> watch::Receiver<bool> {
        self.scheduler.inner.visible.subscribe()
    }

    pub(crate) async fn needs_refresh(&self) -> bool {
        self.scheduler.inner.needs_refresh(&self.key).await
    }

    pub(crate) fn refresh_in_background(&self) {
        drop(self.trigger());
    }
}
