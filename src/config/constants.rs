// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known addresses and constants
//!
//! This module centralizes default timings, indexer error codes, and
//! well-known testnet addresses used throughout the multiscan crate.

use std::time::Duration;

/// Default indexer request timeout
pub const DEFAULT_INDEXER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default RPC request timeout
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Staleness threshold for fast-moving data (balances, prices)
pub const FAST_STALE_AFTER: Duration = Duration::from_secs(10);

/// Background refresh period for fast-moving data
pub const FAST_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Staleness threshold for indexer listings
///
/// Equal to the refresh interval: a listing is fresh until the next tick.
pub const LISTING_STALE_AFTER: Duration = Duration::from_secs(600);

/// Background refresh period for indexer listings
pub const LISTING_REFRESH_INTERVAL: Duration = Duration::from_secs(600);

/// Indexer `extensions.code` values reporting an entity the indexer does not have
pub const TERMINAL_INDEXER_CODES: &[&str] = &["UNSUPPORTED_ENTITY", "TOKEN_NOT_INDEXED"];

/// Well-known testnet token addresses
pub mod testnet {
    use alloy_primitives::{address, Address};

    /// Circle USDC on Sepolia
    ///
    /// Contract: 0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238
    pub const SEPOLIA_USDC: Address = address!("1c7d4b196cb0c7b01d743fbc6116a902379c7238");

    /// Circle USDC on Base Sepolia
    ///
    /// Contract: 0x036CbD53842c5426634e7929541eC2318f3dCF7e
    pub const BASE_SEPOLIA_USDC: Address = address!("036cbd53842c5426634e7929541ec2318f3dcf7e");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_fresh_until_next_interval() {
        assert_eq!(LISTING_STALE_AFTER, LISTING_REFRESH_INTERVAL);
    }

    #[test]
    fn test_fast_data_goes_stale_before_refresh() {
        assert!(FAST_STALE_AFTER < FAST_REFRESH_INTERVAL);
    }

    #[test]
    fn test_testnet_usdc_addresses_differ() {
        assert_ne!(testnet::SEPOLIA_USDC, testnet::BASE_SEPOLIA_USDC);
    }
}
