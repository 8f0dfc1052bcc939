// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Supply and borrow positions of one account

use alloy_primitives::Address;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::{indexer_data, required_field, TokenInfo};
use crate::chain::ChainEndpoint;
use crate::errors::DecodeError;
use crate::executor::{ChainQuery, QueryRequest, QueryResponse};
use crate::query::{LogicalQuery, QueryKind};
use crate::types::amount::RawAmount;

const POSITIONS_DOCUMENT: &str = r#"query Positions($account: String!) {
  positions(where: { account: $account }) {
    id
    pool { id asset { id symbol decimals } }
    supplied
    borrowed
  }
}"#;

/// An account's position in one pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    /// Position identifier as assigned by the indexer
    pub id: String,
    /// Pool the position is in
    pub pool_id: String,
    /// Pool asset
    pub asset: TokenInfo,
    /// Amount supplied, in whole tokens
    pub supplied: BigDecimal,
    /// Amount borrowed, in whole tokens
    pub borrowed: BigDecimal,
}

#[derive(Deserialize)]
struct PoolRef {
    id: String,
    asset: TokenInfo,
}

#[derive(Deserialize)]
struct PositionRow {
    id: String,
    pool: PoolRef,
    supplied: RawAmount,
    borrowed: RawAmount,
}

/// Positions of one account across every indexed chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionsQuery {
    account: Address,
}

impl PositionsQuery {
    /// Positions held by `account`
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    /// The account
    pub fn account(&self) -> Address {
        self.account
    }
}

impl ChainQuery for PositionsQuery {
    type Record = Position;

    fn logical_query(&self) -> LogicalQuery {
        LogicalQuery::new(QueryKind::Positions).with_param("account", self.account)
    }

    fn request(&self, endpoint: &ChainEndpoint) -> Option<QueryRequest> {
        QueryRequest::indexer(endpoint, POSITIONS_DOCUMENT, &self.logical_query())
    }

    fn decode(
        &self,
        _endpoint: &ChainEndpoint,
        response: QueryResponse,
    ) -> Result<Vec<Position>, DecodeError> {
        let mut data = indexer_data(response)?;
        let rows: Vec<PositionRow> = required_field(&mut data, "positions")?;

        Ok(rows
            .into_iter()
            .map(|row| Position {
                supplied: row.pool.asset.normalize(row.supplied),
                borrowed: row.pool.asset.normalize(row.borrowed),
                id: row.id,
                pool_id: row.pool.id,
                asset: row.pool.asset,
            })
            .collect())
    }
}
