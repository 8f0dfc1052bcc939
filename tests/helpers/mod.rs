// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for multiscan integration tests
//!
//! Provides scripted implementations of the transport traits so aggregation
//! and scheduling can be tested without real indexers or RPC nodes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use multiscan::transport::{ContractCall, ContractTransport, GraphQlError, IndexerTransport};
use multiscan::{
    Aggregator, ChainEndpoint, ChainId, ChainRegistry, ContractCallError, IndexerError,
    QueryExecutor, RetryPolicy,
};
use serde_json::{json, Map, Value};
use url::Url;

/// One scripted indexer reply
#[derive(Debug, Clone)]
pub enum IndexerReply {
    /// `data` object returned on success
    Data(Value),
    /// Non-success HTTP status
    Status(u16),
    /// GraphQL error carrying `extensions.code`
    Coded(&'static str),
}

impl IndexerReply {
    fn into_result(self) -> Result<Value, IndexerError> {
        match self {
            IndexerReply::Data(data) => Ok(data),
            IndexerReply::Status(status) => Err(IndexerError::Status { status }),
            IndexerReply::Coded(code) => Err(IndexerError::backend(vec![
                GraphQlError::with_code("rejected", code),
            ])),
        }
    }
}

#[derive(Debug, Default)]
struct IndexerScript {
    replies: HashMap<Url, Vec<IndexerReply>>,
    calls: HashMap<Url, usize>,
    variables: Vec<Map<String, Value>>,
}

/// Scripted [`IndexerTransport`]
///
/// Each endpoint replays its script in order; the last reply repeats forever.
///
/// ```rust,ignore
/// let indexer = MockIndexer::new()
///     .with_replies(sepolia_url(), vec![IndexerReply::Status(503), pools_data()])
///     .with_delay(Duration::from_millis(50));
/// ```
#[derive(Debug, Default)]
pub struct MockIndexer {
    script: Mutex<IndexerScript>,
    delay: Option<Duration>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `url` with `reply`
    pub fn with_reply(self, url: Url, reply: IndexerReply) -> Self {
        self.with_replies(url, vec![reply])
    }

    /// Answer `url` with `replies` in order, repeating the last one
    pub fn with_replies(self, url: Url, replies: Vec<IndexerReply>) -> Self {
        self.script.lock().unwrap().replies.insert(url, replies);
        self
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the script for `url` on a shared mock
    pub fn set_replies(&self, url: Url, replies: Vec<IndexerReply>) {
        self.script.lock().unwrap().replies.insert(url, replies);
    }

    /// Number of requests sent to `url`
    pub fn calls(&self, url: &Url) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Number of requests sent to any endpoint
    pub fn total_calls(&self) -> usize {
        self.script.lock().unwrap().calls.values().sum()
    }

    /// Variables of every request, in arrival order
    pub fn captured_variables(&self) -> Vec<Map<String, Value>> {
        self.script.lock().unwrap().variables.clone()
    }
}

#[async_trait]
impl IndexerTransport for MockIndexer {
    async fn execute(
        &self,
        endpoint: &Url,
        _document: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, IndexerError> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            let call = {
                let calls = script.calls.entry(endpoint.clone()).or_default();
                *calls += 1;
                *calls - 1
            };
            script.variables.push(variables.clone());
            script
                .replies
                .get(endpoint)
                .and_then(|replies| replies.get(call).or_else(|| replies.last()))
                .cloned()
                .unwrap_or(IndexerReply::Status(404))
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}

/// Scripted reply of one chain's token contract
#[derive(Debug, Clone)]
pub enum ContractReply {
    /// `balanceOf` and `decimals` results
    Balance { raw: u64, decimals: u8 },
    /// Every call reverts
    Revert,
    /// Every call fails at the transport
    Unreachable,
}

/// Scripted [`ContractTransport`] answering `balanceOf`/`decimals` per chain
#[derive(Debug, Default)]
pub struct MockContracts {
    replies: HashMap<ChainId, ContractReply>,
    calls: Mutex<HashMap<ChainId, usize>>,
}

impl MockContracts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, chain: ChainId, reply: ContractReply) -> Self {
        self.replies.insert(chain, reply);
        self
    }

    /// Number of individual calls sent to `chain`
    pub fn calls(&self, chain: ChainId) -> usize {
        self.calls.lock().unwrap().get(&chain).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ContractTransport for MockContracts {
    async fn call(
        &self,
        chain: ChainId,
        call: &ContractCall,
    ) -> Result<Vec<DynSolValue>, ContractCallError> {
        *self.calls.lock().unwrap().entry(chain).or_default() += 1;

        match self.replies.get(&chain) {
            None => Err(ContractCallError::NoProvider { chain }),
            Some(ContractReply::Revert) => {
                Err(ContractCallError::reverted(&call.signature, "execution reverted"))
            }
            Some(ContractReply::Unreachable) => Err(ContractCallError::transport(
                &call.signature,
                std::io::Error::other("connection reset"),
            )),
            Some(ContractReply::Balance { raw, decimals }) => {
                if call.signature.starts_with("decimals") {
                    Ok(vec![DynSolValue::Uint(U256::from(*decimals), 8)])
                } else {
                    Ok(vec![DynSolValue::Uint(U256::from(*raw), 256)])
                }
            }
        }
    }
}

pub fn indexer_url(chain: ChainId) -> Url {
    Url::parse(&format!("https://indexer.test/{chain}")).unwrap()
}

pub fn rpc_url(chain: ChainId) -> Url {
    Url::parse(&format!("https://rpc.test/{chain}")).unwrap()
}

/// Endpoint with an indexer and an RPC URL
pub fn endpoint(chain: ChainId) -> ChainEndpoint {
    ChainEndpoint::new(chain)
        .with_indexer_url(indexer_url(chain))
        .with_rpc_url(rpc_url(chain))
}

/// Registry of indexed and RPC-enabled endpoints
pub fn registry(chains: &[ChainId]) -> Arc<ChainRegistry> {
    Arc::new(ChainRegistry::from_endpoints(chains.iter().copied().map(endpoint)).unwrap())
}

/// Sepolia and Base Sepolia with their USDC deployments and both backends
pub fn testnet_registry() -> Arc<ChainRegistry> {
    Arc::new(
        ChainRegistry::builder()
            .add(
                ChainEndpoint::sepolia()
                    .with_indexer_url(indexer_url(ChainId::SEPOLIA))
                    .with_rpc_url(rpc_url(ChainId::SEPOLIA)),
            )
            .add(
                ChainEndpoint::base_sepolia()
                    .with_indexer_url(indexer_url(ChainId::BASE_SEPOLIA))
                    .with_rpc_url(rpc_url(ChainId::BASE_SEPOLIA)),
            )
            .build()
            .unwrap(),
    )
}

/// Retry policy with short delays so paused-clock tests stay readable
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(3)
        .base_delay(Duration::from_millis(100))
        .max_delay(Duration::from_millis(300))
        .build()
}

/// Aggregator over the given mocks
pub fn aggregator(
    registry: Arc<ChainRegistry>,
    indexer: Arc<MockIndexer>,
    contracts: Arc<MockContracts>,
) -> Aggregator {
    let executor = QueryExecutor::new(indexer, contracts)
        .with_terminal_codes(["TOKEN_NOT_INDEXED".to_string()]);
    Aggregator::new(registry, executor).with_retry_policy(fast_retry())
}

/// Indexer `data` object with one pool per id
pub fn pools_data(ids: &[&str]) -> IndexerReply {
    let pools: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "name": format!("{id} pool"),
                "asset": {
                    "id": "0x1c7d4b196cb0c7b01d743fbc6116a902379c7238",
                    "symbol": "USDC",
                    "decimals": 6
                },
                "totalSupplied": "1500000",
                "totalBorrowed": "250000"
            })
        })
        .collect();
    IndexerReply::Data(json!({ "pools": pools }))
}

/// Indexer `data` object with no positions
pub fn empty_positions() -> IndexerReply {
    IndexerReply::Data(json!({ "positions": [] }))
}

pub fn account() -> Address {
    "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01".parse().unwrap()
}
