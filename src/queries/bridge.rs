// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Outgoing bridge transfers of one account

use alloy_primitives::{Address, TxHash};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use super::{indexer_data, page_size, required_field, TokenInfo};
use crate::chain::{ChainEndpoint, ChainId};
use crate::errors::DecodeError;
use crate::executor::{ChainQuery, QueryRequest, QueryResponse};
use crate::query::{LogicalQuery, QueryKind};
use crate::types::amount::RawAmount;

const BRIDGE_TRANSACTIONS_DOCUMENT: &str = r#"query BridgeTransactions($sender: String!, $first: Int!) {
  bridgeTransactions(
    where: { sender: $sender }
    first: $first
    orderBy: timestamp
    orderDirection: desc
  ) {
    id
    txHash
    sender
    recipient
    token { id symbol decimals }
    amount
    destinationChainId
    timestamp
  }
}"#;

/// Default page size
pub const DEFAULT_BRIDGE_PAGE: u32 = 50;

/// A bridge transfer leaving one chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeTransaction {
    /// Transfer identifier as assigned by the indexer
    pub id: String,
    /// Source transaction
    pub tx_hash: TxHash,
    /// Sending account
    pub sender: Address,
    /// Receiving account on the destination chain
    pub recipient: Address,
    /// Bridged token
    pub token: TokenInfo,
    /// Amount, in whole tokens
    pub amount: BigDecimal,
    /// Destination chain
    pub destination_chain: ChainId,
    /// Source block time
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeRow {
    id: String,
    tx_hash: TxHash,
    sender: Address,
    recipient: Address,
    token: TokenInfo,
    amount: RawAmount,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    destination_chain_id: u64,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    timestamp: u64,
}

/// Indexers encode `BigInt` scalars as strings and `Int` as numbers
fn u64_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

impl TryFrom<BridgeRow> for BridgeTransaction {
    type Error = DecodeError;

    fn try_from(row: BridgeRow) -> Result<Self, Self::Error> {
        let timestamp = i64::try_from(row.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| {
                DecodeError::malformed(format!("timestamp {} out of range", row.timestamp))
            })?;

        Ok(BridgeTransaction {
            amount: row.token.normalize(row.amount),
            id: row.id,
            tx_hash: row.tx_hash,
            sender: row.sender,
            recipient: row.recipient,
            token: row.token,
            destination_chain: ChainId::new(row.destination_chain_id),
            timestamp,
        })
    }
}

/// Bridge transfers sent by one account, across every indexed chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTransactionsQuery {
    sender: Address,
    first: u32,
}

impl BridgeTransactionsQuery {
    /// Transfers sent by `sender`
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            first: DEFAULT_BRIDGE_PAGE,
        }
    }

    /// Limit the number of transfers per chain
    #[must_use]
    ///
    /// Values above `i32::MAX` are clamped.
    pub fn with_first(mut self, first: u32) -> Self {
        self.first = page_size(first);
        self
    }
}

impl ChainQuery for BridgeTransactionsQuery {
    type Record = BridgeTransaction;

    fn logical_query(&self) -> LogicalQuery {
        LogicalQuery::new(QueryKind::BridgeTransactions)
            .with_param("sender", self.sender)
            .with_param("first", u64::from(self.first))
    }

    fn request(&self, endpoint: &ChainEndpoint) -> Option<QueryRequest> {
        QueryRequest::indexer(endpoint, BRIDGE_TRANSACTIONS_DOCUMENT, &self.logical_query())
    }

    fn decode(
        &self,
        _endpoint: &ChainEndpoint,
        response: QueryResponse,
    ) -> Result<Vec<BridgeTransaction>, DecodeError> {
        let mut data = indexer_data(response)?;
        let rows: Vec<BridgeRow> = required_field(&mut data, "bridgeTransactions")?;
        rows.into_iter().map(BridgeTransaction::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn row(destination: serde_json::Value, timestamp: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "0xabc-0",
            "txHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "sender": "0x2222222222222222222222222222222222222222",
            "recipient": "0x3333333333333333333333333333333333333333",
            "token": {
                "id": "0x94a9d9ac8a22534e3faca9f4e7f2e2cf85d5e4c8",
                "symbol": "USDC",
                "decimals": 6
            },
            "amount": "12500000",
            "destinationChainId": destination,
            "timestamp": timestamp
        })
    }

    #[test]
    fn test_decode_accepts_string_and_number_integers() {
        let endpoint = ChainEndpoint::new(ChainId::SEPOLIA);
        let query = BridgeTransactionsQuery::new(Address::ZERO);
        let response = QueryResponse::Indexer(json!({
            "bridgeTransactions": [
                row(json!("84532"), json!("1700000000")),
                row(json!(84532), json!(1700000000u64)),
            ]
        }));

        let transfers = query.decode(&endpoint, response).unwrap();
        assert_eq!(transfers.len(), 2);
        for transfer in &transfers {
            assert_eq!(transfer.destination_chain, ChainId::BASE_SEPOLIA);
            assert_eq!(transfer.amount, BigDecimal::from_str("12.5").unwrap());
            assert_eq!(transfer.timestamp.timestamp(), 1_700_000_000);
        }
    }

    #[test]
    fn test_decode_rejects_missing_list() {
        let endpoint = ChainEndpoint::new(ChainId::SEPOLIA);
        let query = BridgeTransactionsQuery::new(Address::ZERO);
        let result = query.decode(&endpoint, QueryResponse::Indexer(json!({})));
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn test_logical_query_identity() {
        let query = BridgeTransactionsQuery::new(Address::ZERO).with_first(10);
        let logical = query.logical_query();
        assert_eq!(logical.kind(), QueryKind::BridgeTransactions);
        assert_eq!(logical.variables()["first"], 10);
    }

    #[test]
    fn test_oversized_page_is_clamped() {
        let logical = BridgeTransactionsQuery::new(Address::ZERO)
            .with_first(u32::MAX)
            .logical_query();
        assert_eq!(logical.variables()["first"], 2_147_483_647);
    }
}
