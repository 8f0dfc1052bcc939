// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Concrete per-kind queries
//!
//! Each query implements [`ChainQuery`](crate::ChainQuery):
//!
//! | Query                       | Backend  | Scoped by          |
//! |-----------------------------|----------|--------------------|
//! | [`PoolsQuery`]              | indexer  | nothing            |
//! | [`PositionsQuery`]          | indexer  | account            |
//! | [`BridgeTransactionsQuery`] | indexer  | sender             |
//! | [`NftOwnershipQuery`]       | indexer  | owner, collection  |
//! | [`TokenBalanceQuery`]       | contract | token, account     |
//!
//! Integer amounts arrive as decimal strings from the indexer and as `uint256`
//! from contracts; both are normalized with
//! [`RawAmount::normalize`](crate::RawAmount::normalize) during decoding.

use alloy_primitives::Address;
use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DecodeError;
use crate::executor::QueryResponse;
use crate::types::amount::{RawAmount, TokenDecimals};

mod balances;
mod bridge;
mod nft;
mod pools;
mod positions;

pub use balances::{TokenBalance, TokenBalanceQuery};
pub use bridge::{BridgeTransaction, BridgeTransactionsQuery};
pub use nft::{Nft, NftOwnershipQuery};
pub use pools::{LendingPool, PoolsQuery};
pub use positions::{Position, PositionsQuery};

/// Token metadata as the indexers ship it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token contract address
    #[serde(rename = "id")]
    pub address: Address,
    /// Ticker symbol
    pub symbol: String,
    /// Decimal precision
    pub decimals: TokenDecimals,
}

impl TokenInfo {
    /// Normalize a raw amount of this token
    pub fn normalize(&self, raw: RawAmount) -> BigDecimal {
        raw.normalize(self.decimals)
    }
}

/// Largest page size representable as a GraphQL `Int`
pub(crate) const MAX_PAGE: u32 = i32::MAX as u32;

/// Clamp a requested page size to what a GraphQL `Int` can carry
pub(crate) fn page_size(first: u32) -> u32 {
    first.min(MAX_PAGE)
}

/// Unwrap an indexer response
pub(crate) fn indexer_data(response: QueryResponse) -> Result<Value, DecodeError> {
    match response {
        QueryResponse::Indexer(data) => Ok(data),
        QueryResponse::Contract(_) => Err(DecodeError::malformed(
            "expected an indexer response, got contract outputs",
        )),
    }
}

/// Deserialize a required top-level field of an indexer `data` object
pub(crate) fn required_field<T: DeserializeOwned>(
    data: &mut Value,
    name: &str,
) -> Result<T, DecodeError> {
    match data.get_mut(name).map(Value::take) {
        None | Some(Value::Null) => Err(DecodeError::malformed(format!(
            "missing field `{name}`"
        ))),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}
