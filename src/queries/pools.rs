// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Lending pool listings

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::{indexer_data, page_size, required_field, TokenInfo};
use crate::chain::ChainEndpoint;
use crate::errors::DecodeError;
use crate::executor::{ChainQuery, QueryRequest, QueryResponse};
use crate::query::{LogicalQuery, QueryKind};
use crate::types::amount::RawAmount;

const POOLS_DOCUMENT: &str = r#"query Pools($first: Int!) {
  pools(first: $first, orderBy: totalSupplied, orderDirection: desc) {
    id
    name
    asset { id symbol decimals }
    totalSupplied
    totalBorrowed
    supplyRate
    borrowRate
  }
}"#;

/// Default page size
pub const DEFAULT_POOLS_PAGE: u32 = 100;

/// A lending pool on one chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LendingPool {
    /// Pool identifier as assigned by the indexer
    pub id: String,
    /// Display name, when the pool has one
    pub name: Option<String>,
    /// Underlying asset
    pub asset: TokenInfo,
    /// Total supplied, in whole tokens
    pub total_supplied: BigDecimal,
    /// Total borrowed, in whole tokens
    pub total_borrowed: BigDecimal,
    /// Annualized supply rate, as reported
    pub supply_rate: Option<BigDecimal>,
    /// Annualized borrow rate, as reported
    pub borrow_rate: Option<BigDecimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    asset: TokenInfo,
    total_supplied: RawAmount,
    total_borrowed: RawAmount,
    #[serde(default)]
    supply_rate: Option<BigDecimal>,
    #[serde(default)]
    borrow_rate: Option<BigDecimal>,
}

impl From<PoolRow> for LendingPool {
    fn from(row: PoolRow) -> Self {
        LendingPool {
            total_supplied: row.asset.normalize(row.total_supplied),
            total_borrowed: row.asset.normalize(row.total_borrowed),
            id: row.id,
            name: row.name,
            asset: row.asset,
            supply_rate: row.supply_rate,
            borrow_rate: row.borrow_rate,
        }
    }
}

/// Every lending pool listed by each chain's indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolsQuery {
    first: u32,
}

impl Default for PoolsQuery {
    fn default() -> Self {
        Self {
            first: DEFAULT_POOLS_PAGE,
        }
    }
}

impl PoolsQuery {
    /// Query the default page of pools
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of pools per chain
    #[must_use]
    ///
    /// Values above `i32::MAX` are clamped.
    pub fn with_first(mut self, first: u32) -> Self {
        self.first = page_size(first);
        self
    }
}

impl ChainQuery for PoolsQuery {
    type Record = LendingPool;

    fn logical_query(&self) -> LogicalQuery {
        LogicalQuery::new(QueryKind::Pools).with_param("first", u64::from(self.first))
    }

    fn request(&self, endpoint: &ChainEndpoint) -> Option<QueryRequest> {
        QueryRequest::indexer(endpoint, POOLS_DOCUMENT, &self.logical_query())
    }

    fn decode(
        &self,
        _endpoint: &ChainEndpoint,
        response: QueryResponse,
    ) -> Result<Vec<LendingPool>, DecodeError> {
        let mut data = indexer_data(response)?;
        let rows: Vec<PoolRow> = required_field(&mut data, "pools")?;
        Ok(rows.into_iter().map(LendingPool::from).collect())
    }
}
