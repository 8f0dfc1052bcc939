// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only chain registry and its builder

use std::collections::BTreeMap;
use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;
use tracing::info;

use super::{ChainEndpoint, ChainId};
use crate::errors::RegistryError;

/// Process-wide lookup table from [`ChainId`] to [`ChainEndpoint`]
///
/// Iteration is in ascending chain id order, which keeps fan-out deterministic.
/// Share it behind an `Arc`; nothing in this crate mutates a built registry.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    endpoints: BTreeMap<ChainId, ChainEndpoint>,
}

/// On-disk shape of a registry source
#[derive(Debug, Deserialize)]
struct RegistrySource {
    chains: Vec<ChainEndpoint>,
}

impl ChainRegistry {
    /// Create a builder
    #[must_use]
    pub fn builder() -> ChainRegistryBuilder {
        ChainRegistryBuilder::new()
    }

    /// Build a registry from a list of endpoints
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateChain`] if a chain appears twice.
    pub fn from_endpoints(
        endpoints: impl IntoIterator<Item = ChainEndpoint>,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for endpoint in endpoints {
            let chain_id = endpoint.chain_id;
            if map.insert(chain_id, endpoint).is_some() {
                return Err(RegistryError::DuplicateChain { chain_id });
            }
        }
        Ok(Self { endpoints: map })
    }

    /// Parse a registry from a JSON document of the form `{"chains": [...]}`
    ///
    /// # Example
    ///
    /// ```rust
    /// use multiscan::{ChainId, ChainRegistry};
    ///
    /// let registry = ChainRegistry::from_json_str(r#"{
    ///     "chains": [
    ///         { "chain_id": 11155111, "indexer_url": "https://indexer.example/sepolia" },
    ///         { "chain_id": 84532, "rpc_url": "https://rpc.example/base-sepolia" }
    ///     ]
    /// }"#).unwrap();
    ///
    /// assert_eq!(registry.len(), 2);
    /// assert!(registry.get(ChainId::SEPOLIA).unwrap().has_indexer());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or a chain is duplicated.
    pub fn from_json_str(source: &str) -> Result<Self, RegistryError> {
        let source: RegistrySource = serde_json::from_str(source)
            .map_err(|source| RegistryError::InvalidSource { source })?;
        Self::from_endpoints(source.chains)
    }

    /// Read and parse a JSON registry file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| RegistryError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        let registry = Self::from_json_str(&contents)?;
        info!(
            path = %path.display(),
            chains = registry.len(),
            "Loaded chain registry"
        );
        Ok(registry)
    }

    /// Get the endpoint for a chain
    #[must_use]
    pub fn get(&self, chain: ChainId) -> Option<&ChainEndpoint> {
        self.endpoints.get(&chain)
    }

    /// Check if a chain is configured
    #[must_use]
    pub fn contains(&self, chain: ChainId) -> bool {
        self.endpoints.contains_key(&chain)
    }

    /// All configured endpoints, in ascending chain id order
    pub fn endpoints(&self) -> impl Iterator<Item = &ChainEndpoint> {
        self.endpoints.values()
    }

    /// All configured chains, in ascending order
    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.endpoints.keys().copied()
    }

    /// Chains that have an indexer endpoint
    #[must_use]
    pub fn indexed_chains(&self) -> Vec<ChainId> {
        self.endpoints
            .values()
            .filter(|endpoint| endpoint.has_indexer())
            .map(|endpoint| endpoint.chain_id)
            .collect()
    }

    /// Chains that have an RPC endpoint
    #[must_use]
    pub fn rpc_chains(&self) -> Vec<ChainId> {
        self.endpoints
            .values()
            .filter(|endpoint| endpoint.has_rpc())
            .map(|endpoint| endpoint.chain_id)
            .collect()
    }

    /// Look up a named contract on a chain
    #[must_use]
    pub fn contract(&self, chain: ChainId, name: &str) -> Option<Address> {
        self.get(chain).and_then(|endpoint| endpoint.contract(name))
    }

    /// Number of configured chains
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Check if no chain is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Builder for a [`ChainRegistry`]
#[derive(Debug, Default)]
pub struct ChainRegistryBuilder {
    endpoints: Vec<ChainEndpoint>,
}

impl ChainRegistryBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chain endpoint
    #[must_use]
    pub fn add(mut self, endpoint: ChainEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Build the registry
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateChain`] if a chain was added twice.
    pub fn build(self) -> Result<ChainRegistry, RegistryError> {
        ChainRegistry::from_endpoints(self.endpoints)
    }
}
