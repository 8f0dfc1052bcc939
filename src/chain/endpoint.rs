// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-chain endpoint description

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ChainId;
use crate::config::constants::testnet;

/// Backends and contract addresses for one chain
///
/// Created once from static configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    /// The chain this endpoint serves
    pub chain_id: ChainId,
    /// Human-readable network name, used in logs only
    #[serde(default)]
    pub name: Option<String>,
    /// Indexer query endpoint; `None` excludes the chain from indexer-backed queries
    #[serde(default)]
    pub indexer_url: Option<Url>,
    /// JSON-RPC endpoint for contract reads
    #[serde(default)]
    pub rpc_url: Option<Url>,
    /// Named contract addresses (e.g. `"usdc"`, `"pool_manager"`)
    #[serde(default)]
    pub contracts: BTreeMap<String, Address>,
}

impl ChainEndpoint {
    /// Create an endpoint with no backends configured
    #[must_use]
    pub fn new(chain_id: impl Into<ChainId>) -> Self {
        Self {
            chain_id: chain_id.into(),
            name: None,
            indexer_url: None,
            rpc_url: None,
            contracts: BTreeMap::new(),
        }
    }

    /// Sepolia with its USDC deployment registered as `"usdc"`
    ///
    /// Backend URLs are deployment-specific and left unset.
    #[must_use]
    pub fn sepolia() -> Self {
        Self::new(ChainId::SEPOLIA)
            .with_name("sepolia")
            .with_contract("usdc", testnet::SEPOLIA_USDC)
    }

    /// Base Sepolia with its USDC deployment registered as `"usdc"`
    #[must_use]
    pub fn base_sepolia() -> Self {
        Self::new(ChainId::BASE_SEPOLIA)
            .with_name("base-sepolia")
            .with_contract("usdc", testnet::BASE_SEPOLIA_USDC)
    }

    /// Set the network name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the indexer endpoint
    #[must_use]
    pub fn with_indexer_url(mut self, url: Url) -> Self {
        self.indexer_url = Some(url);
        self
    }

    /// Set the RPC endpoint
    #[must_use]
    pub fn with_rpc_url(mut self, url: Url) -> Self {
        self.rpc_url = Some(url);
        self
    }

    /// Register a named contract address
    #[must_use]
    pub fn with_contract(mut self, name: impl Into<String>, address: Address) -> Self {
        self.contracts.insert(name.into(), address);
        self
    }

    /// Look up a named contract address
    pub fn contract(&self, name: &str) -> Option<Address> {
        self.contracts.get(name).copied()
    }

    /// Whether this chain can serve indexer-backed queries
    pub fn has_indexer(&self) -> bool {
        self.indexer_url.is_some()
    }

    /// Whether this chain can serve contract reads
    pub fn has_rpc(&self) -> bool {
        self.rpc_url.is_some()
    }

    /// Name for log output, falling back to the well-known chain name or the id
    pub fn display_name(&self) -> String {
        match (&self.name, self.chain_id.named()) {
            (Some(name), _) => name.clone(),
            (None, Some(named)) => named.to_string(),
            (None, None) => self.chain_id.to_string(),
        }
    }
}
