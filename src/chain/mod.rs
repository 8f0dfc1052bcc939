// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain registry: the static mapping from chain to its backends
//!
//! Every supported network is described by one [`ChainEndpoint`]: an optional
//! indexer URL, an optional RPC URL and a table of named contract addresses.
//! The [`ChainRegistry`] is built once at startup and is read-only afterwards.
//!
//! A chain without an indexer URL is skipped by indexer-backed queries but
//! still takes part in RPC-backed ones.
//!
//! # Examples
//!
//! ```rust
//! use multiscan::{ChainEndpoint, ChainId, ChainRegistry};
//! use url::Url;
//!
//! let registry = ChainRegistry::builder()
//!     .add(
//!         ChainEndpoint::new(ChainId::SEPOLIA)
//!             .with_indexer_url(Url::parse("https://indexer.example/sepolia").unwrap()),
//!     )
//!     .add(ChainEndpoint::new(ChainId::BASE_SEPOLIA))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.indexed_chains(), vec![ChainId::SEPOLIA]);
//! ```

mod endpoint;
mod registry;

pub use endpoint::ChainEndpoint;
pub use registry::{ChainRegistry, ChainRegistryBuilder};

use std::fmt;

use alloy_chains::NamedChain;
use serde::{Deserialize, Serialize};

/// Opaque numeric chain identifier (the EIP-155 chain id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    /// Ethereum Sepolia testnet
    pub const SEPOLIA: Self = Self(NamedChain::Sepolia as u64);

    /// Base Sepolia testnet
    pub const BASE_SEPOLIA: Self = Self(NamedChain::BaseSepolia as u64);

    /// Create a chain id from its numeric value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The well-known chain this id refers to, if any
    pub fn named(&self) -> Option<NamedChain> {
        NamedChain::try_from(self.0).ok()
    }
}

impl From<NamedChain> for ChainId {
    fn from(chain: NamedChain) -> Self {
        Self(chain as u64)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
