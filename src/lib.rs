// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # Multiscan
//!
//! Read-only, cross-chain DeFi data aggregation.
//!
//! One logical query (lending pools, an account's positions, bridge
//! transfers, NFT holdings, token balances) is fanned out to every configured
//! chain, each chain's indexer or contracts are read, and the per-chain results
//! are merged into a single chain-tagged list. Failing chains are reported
//! instead of failing the whole read.
//!
//! ## Components
//!
//! - [`ChainRegistry`]: per-chain indexer URL, RPC URL and contract addresses
//! - [`normalize_amount`]: raw integer token amounts to exact decimals
//! - [`QueryExecutor`]: one query against one chain, failures classified once
//! - [`Aggregator`]: concurrent fan-out, tagging and the partial-failure policy
//! - [`RetryPolicy`]: bounded backoff for transient failures
//! - [`RefreshScheduler`]: cache freshness, request de-duplication and
//!   background refresh
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use multiscan::{Aggregator, ChainRegistry, ChainScope, MultiscanConfig, PoolsQuery};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ChainRegistry::from_json_file("chains.json").await?);
//! let aggregator = Aggregator::connect(registry, &MultiscanConfig::default())?;
//!
//! let pools = aggregator.aggregate(&PoolsQuery::new(), &ChainScope::All).await?;
//! for tagged in &pools.records {
//!     let name = tagged.record.name.as_deref().unwrap_or(&tagged.record.id);
//!     println!("{} {name}", tagged.chain_id);
//! }
//! if pools.is_partial() {
//!     eprintln!("unavailable: {:?}", pools.failed_chains);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;

mod aggregate;
mod chain;
mod config;
mod errors;
mod executor;
mod queries;
mod query;
mod retry;
mod scheduler;
mod spans;
pub mod transport;
mod types;

pub use aggregate::{AggregateResult, Aggregator, ChainTagged};
pub use chain::{ChainEndpoint, ChainId, ChainRegistry, ChainRegistryBuilder};
pub use config::{constants, MultiscanConfig, MultiscanConfigBuilder, RefreshPolicy};
pub use errors::{
    AggregateError, AmountError, ContractCallError, DecodeError, FailureKind, FetchError,
    FetchFailure, IndexerError, MultiscanError, RegistryError,
};
pub use executor::{ChainQuery, FetchOutcome, QueryExecutor, QueryRequest, QueryResponse};
pub use queries::{
    BridgeTransaction, BridgeTransactionsQuery, LendingPool, Nft, NftOwnershipQuery, PoolsQuery,
    Position, PositionsQuery, TokenBalance, TokenBalanceQuery, TokenInfo,
};
pub use query::{ChainScope, LogicalQuery, QueryKind, QueryParam, UnknownQueryKind};
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use scheduler::{
    CacheEntry, CacheKey, CacheState, CacheStats, CacheStore, MemoryStore, QueryHandle,
    QueryState, RefreshScheduler, Subscription,
};
pub use types::amount::{normalize_amount, RawAmount, TokenDecimals};
