// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Query executor: one logical query against one chain
//!
//! A [`ChainQuery`] describes how a query kind maps onto a chain's backends: it
//! builds a [`QueryRequest`] from the chain's endpoint (or declines when the
//! chain cannot serve it) and decodes the raw [`QueryResponse`] into typed
//! records. The [`QueryExecutor`] performs the request through the configured
//! transports and classifies every failure as [`FailureKind::Transient`] or
//! [`FailureKind::Terminal`] exactly once, here.
//!
//! The executor holds no state between calls.
//!
//! [`FailureKind::Transient`]: crate::FailureKind::Transient
//! [`FailureKind::Terminal`]: crate::FailureKind::Terminal

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use serde_json::{Map, Value};
use url::Url;

use crate::chain::{ChainEndpoint, ChainId};
use crate::errors::{DecodeError, FetchError, FetchFailure};
use crate::query::LogicalQuery;
use crate::transport::{ContractCall, ContractTransport, IndexerTransport};

/// What to send to a chain's backend
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    /// A GraphQL document for the chain's indexer
    Indexer {
        /// Indexer endpoint
        endpoint: Url,
        /// Query document
        document: String,
        /// Bound (canonicalized) variables
        variables: Map<String, Value>,
    },
    /// Independent contract reads on the chain's RPC
    Contract {
        /// Calls to batch
        calls: Vec<ContractCall>,
    },
}

impl QueryRequest {
    /// Indexer request for a chain, or `None` if the chain has no indexer
    ///
    /// Variables come from [`LogicalQuery::variables`], so addresses are
    /// already lower-cased.
    pub fn indexer(
        endpoint: &ChainEndpoint,
        document: &str,
        query: &LogicalQuery,
    ) -> Option<Self> {
        endpoint.indexer_url.as_ref().map(|url| QueryRequest::Indexer {
            endpoint: url.clone(),
            document: document.to_string(),
            variables: query.variables(),
        })
    }

    /// Contract request for a chain, or `None` if the chain has no RPC
    pub fn contract(endpoint: &ChainEndpoint, calls: Vec<ContractCall>) -> Option<Self> {
        endpoint
            .has_rpc()
            .then_some(QueryRequest::Contract { calls })
    }

    /// Which backend serves this request, for logs and spans
    pub fn backend(&self) -> &'static str {
        match self {
            QueryRequest::Indexer { .. } => "indexer",
            QueryRequest::Contract { .. } => "contract",
        }
    }
}

/// Raw response of a [`QueryRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    /// The indexer's `data` object
    Indexer(Value),
    /// Decoded outputs, one entry per call
    Contract(Vec<Vec<DynSolValue>>),
}

/// A query kind's mapping onto per-chain backends
pub trait ChainQuery: Send + Sync + 'static {
    /// The domain record produced per chain
    type Record: Clone + Debug + Send + Sync + 'static;

    /// Chain-independent identity of this query
    fn logical_query(&self) -> LogicalQuery;

    /// Request for one chain, or `None` when the chain has no usable endpoint
    ///
    /// Returning `None` excludes the chain from the aggregation without
    /// counting it as a failure.
    fn request(&self, endpoint: &ChainEndpoint) -> Option<QueryRequest>;

    /// Decode a response into records
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Unsupported`] when the backend explicitly has no
    /// such entity, and [`DecodeError::Malformed`] for unexpected shapes.
    fn decode(
        &self,
        endpoint: &ChainEndpoint,
        response: QueryResponse,
    ) -> Result<Vec<Self::Record>, DecodeError>;
}

/// Per-chain outcome of one execution
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// The chain answered
    Ok {
        /// Chain that produced the value
        chain: ChainId,
        /// Decoded value
        value: T,
    },
    /// The chain failed
    Err {
        /// Chain that failed
        chain: ChainId,
        /// Classified failure
        error: FetchError,
    },
}

impl<T> FetchOutcome<T> {
    /// Tag a result with its chain
    pub fn from_result(chain: ChainId, result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Ok { chain, value },
            Err(error) => FetchOutcome::Err { chain, error },
        }
    }

    /// The chain this outcome belongs to
    pub fn chain(&self) -> ChainId {
        match self {
            FetchOutcome::Ok { chain, .. } | FetchOutcome::Err { chain, .. } => *chain,
        }
    }

    /// Whether the chain answered
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Ok { .. })
    }

    /// Drop the chain tag
    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            FetchOutcome::Ok { value, .. } => Ok(value),
            FetchOutcome::Err { error, .. } => Err(error),
        }
    }
}

/// Executes a [`ChainQuery`] against one chain
#[derive(Clone)]
pub struct QueryExecutor {
    indexer: Arc<dyn IndexerTransport>,
    contracts: Arc<dyn ContractTransport>,
    terminal_codes: Arc<BTreeSet<String>>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("terminal_codes", &self.terminal_codes)
            .finish_non_exhaustive()
    }
}

impl QueryExecutor {
    /// Create an executor over the given transports
    ///
    /// No indexer error code is considered terminal until
    /// [`with_terminal_codes`](Self::with_terminal_codes) is called.
    pub fn new(indexer: Arc<dyn IndexerTransport>, contracts: Arc<dyn ContractTransport>) -> Self {
        Self {
            indexer,
            contracts,
            terminal_codes: Arc::new(BTreeSet::new()),
        }
    }

    /// Indexer `extensions.code` values that mark a failure as terminal
    #[must_use]
    pub fn with_terminal_codes(mut self, codes: impl IntoIterator<Item = String>) -> Self {
        self.terminal_codes = Arc::new(codes.into_iter().collect());
        self
    }

    /// Run `query` against one chain
    ///
    /// # Errors
    ///
    /// Returns a classified [`FetchError`]. A chain for which the query builds
    /// no request yields a terminal [`FetchFailure::Unroutable`]; the
    /// aggregator filters such chains out before calling this.
    pub async fn execute<Q: ChainQuery>(
        &self,
        query: &Q,
        endpoint: &ChainEndpoint,
    ) -> Result<Vec<Q::Record>, FetchError> {
        let request = query.request(endpoint).ok_or_else(|| {
            FetchError::terminal(FetchFailure::Unroutable {
                query: query.logical_query().to_string(),
            })
        })?;

        let response = match request {
            QueryRequest::Indexer {
                endpoint: url,
                document,
                variables,
            } => {
                let data = self
                    .indexer
                    .execute(&url, &document, &variables)
                    .await
                    .map_err(|e| FetchError::from_indexer(e, &self.terminal_codes))?;
                QueryResponse::Indexer(data)
            }
            QueryRequest::Contract { calls } => {
                let outputs = self
                    .contracts
                    .call_batch(endpoint.chain_id, &calls)
                    .await
                    .map_err(FetchError::from)?;
                QueryResponse::Contract(outputs)
            }
        };

        query
            .decode(endpoint, response)
            .map_err(FetchError::from)
    }
}
