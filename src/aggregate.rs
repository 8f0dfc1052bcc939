// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Fan-out aggregation across chains
//!
//! [`Aggregator::aggregate`] runs one [`ChainQuery`] against every targeted
//! chain concurrently, waits for all of them (a join, never a race), tags each
//! record with the chain that produced it, and applies the failure policy:
//!
//! - a multi-chain aggregation never fails; failing chains are listed in
//!   [`AggregateResult::failed_chains`]
//! - an aggregation scoped to exactly one chain propagates that chain's failure
//!
//! Chains without a usable endpoint for the query are left out before any call
//! is made and are not counted as failures.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn, Instrument};

use crate::chain::{ChainEndpoint, ChainId, ChainRegistry};
use crate::config::MultiscanConfig;
use crate::errors::{AggregateError, MultiscanError};
use crate::executor::{ChainQuery, FetchOutcome, QueryExecutor};
use crate::query::ChainScope;
use crate::retry::RetryPolicy;
use crate::spans;
use crate::transport::{AlloyContractTransport, HttpIndexerTransport};

/// A record tagged with the chain whose endpoint produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainTagged<T> {
    /// Source chain
    pub chain_id: ChainId,
    /// The record
    #[serde(flatten)]
    pub record: T,
}

impl<T> ChainTagged<T> {
    /// Tag a record
    pub fn new(chain_id: ChainId, record: T) -> Self {
        Self { chain_id, record }
    }
}

/// Merged outcome of one aggregation
///
/// Records of one chain keep the order the chain returned them in. There is
/// no ordering guarantee across chains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult<T> {
    /// Records from every chain that answered
    pub records: Vec<ChainTagged<T>>,
    /// Chains that failed; empty on full success
    pub failed_chains: BTreeSet<ChainId>,
}

impl<T> Default for AggregateResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failed_chains: BTreeSet::new(),
        }
    }
}

impl<T> AggregateResult<T> {
    /// Whether at least one chain failed
    pub fn is_partial(&self) -> bool {
        !self.failed_chains.is_empty()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records produced by one chain
    pub fn records_for(&self, chain: ChainId) -> impl Iterator<Item = &T> {
        self.records
            .iter()
            .filter(move |tagged| tagged.chain_id == chain)
            .map(|tagged| &tagged.record)
    }

    /// Chains that contributed at least one record
    pub fn chains(&self) -> BTreeSet<ChainId> {
        self.records.iter().map(|tagged| tagged.chain_id).collect()
    }
}

/// Fans one query out over the chain registry
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<ChainRegistry>,
    executor: QueryExecutor,
    retry: RetryPolicy,
}

impl Aggregator {
    /// Create an aggregator with the default retry policy
    pub fn new(registry: Arc<ChainRegistry>, executor: QueryExecutor) -> Self {
        Self {
            registry,
            executor,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create an aggregator over HTTP transports configured from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn connect(
        registry: Arc<ChainRegistry>,
        config: &MultiscanConfig,
    ) -> Result<Self, MultiscanError> {
        let indexer = HttpIndexerTransport::with_timeout(config.indexer_timeout)?;
        let contracts = AlloyContractTransport::from_registry(&registry, config.rpc_timeout)?;
        let executor = QueryExecutor::new(Arc::new(indexer), Arc::new(contracts))
            .with_terminal_codes(config.terminal_codes.iter().cloned());

        Ok(Self::new(registry, executor).with_retry_policy(config.retry.clone()))
    }

    /// The chain registry
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// The retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Chains `query` would be sent to under `scope`, in ascending order
    pub fn target_chains<Q: ChainQuery>(&self, query: &Q, scope: &ChainScope) -> Vec<ChainId> {
        self.targets(query, scope)
            .into_iter()
            .map(|(endpoint, _)| endpoint.chain_id)
            .collect()
    }

    fn targets<'a, Q: ChainQuery>(
        &'a self,
        query: &Q,
        scope: &ChainScope,
    ) -> Vec<(&'a ChainEndpoint, &'static str)> {
        self.registry
            .endpoints()
            .filter(|endpoint| scope.includes(endpoint.chain_id))
            .filter_map(|endpoint| {
                query
                    .request(endpoint)
                    .map(|request| (endpoint, request.backend()))
            })
            .collect()
    }

    /// Run `query` on every chain in `scope` concurrently and merge the results
    ///
    /// # Errors
    ///
    /// Only when `scope` names exactly one chain and that chain fails after
    /// retries; the failure is returned as [`AggregateError::ChainFailed`].
    pub async fn aggregate<Q: ChainQuery>(
        &self,
        query: &Q,
        scope: &ChainScope,
    ) -> Result<AggregateResult<Q::Record>, AggregateError> {
        let targets = self.targets(query, scope);
        let span = spans::aggregate(&query.logical_query(), scope, targets.len());

        async move {
            let outcomes = join_all(
                targets
                    .iter()
                    .map(|&(endpoint, backend)| self.fetch_chain(query, endpoint, backend)),
            )
            .await;

            let result = merge(outcomes, scope.is_single_chain())?;
            info!(
                records = result.records.len(),
                failed_chains = result.failed_chains.len(),
                "Aggregation complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    async fn fetch_chain<Q: ChainQuery>(
        &self,
        query: &Q,
        endpoint: &ChainEndpoint,
        backend: &'static str,
    ) -> FetchOutcome<Vec<Q::Record>> {
        let chain = endpoint.chain_id;
        let executor = &self.executor;

        let result = self
            .retry
            .run(chain, move || executor.execute(query, endpoint))
            .instrument(spans::fetch_chain(chain, backend))
            .await;

        FetchOutcome::from_result(chain, result)
    }
}

fn merge<T>(
    outcomes: Vec<FetchOutcome<Vec<T>>>,
    single_chain: bool,
) -> Result<AggregateResult<T>, AggregateError> {
    let mut result = AggregateResult::default();

    for outcome in outcomes {
        match outcome {
            FetchOutcome::Ok { chain, value } => result
                .records
                .extend(value.into_iter().map(|record| ChainTagged::new(chain, record))),
            FetchOutcome::Err { chain, error } => {
                if single_chain {
                    return Err(AggregateError::chain_failed(chain, error));
                }
                warn!(
                    chain_id = %chain,
                    kind = %error.kind(),
                    error = %error,
                    "Excluding failed chain from aggregate"
                );
                result.failed_chains.insert(chain);
            }
        }
    }

    Ok(result)
}
