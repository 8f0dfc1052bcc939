// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! NFT ownership

use alloy_primitives::{Address, U256};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{indexer_data, required_field};
use crate::chain::ChainEndpoint;
use crate::errors::DecodeError;
use crate::executor::{ChainQuery, QueryRequest, QueryResponse};
use crate::query::{LogicalQuery, QueryKind};

const OWNED_NFTS_DOCUMENT: &str = r#"query OwnedNfts($owner: String!) {
  nfts(where: { owner: $owner }) {
    tokenId
    uri
    collection { id name symbol }
  }
}"#;

const COLLECTION_NFTS_DOCUMENT: &str = r#"query CollectionNfts($owner: String!, $collection: String!) {
  collection(id: $collection) {
    id
    name
    symbol
    nfts(where: { owner: $owner }) { tokenId uri }
  }
}"#;

/// One NFT held by the queried owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nft {
    /// Collection contract
    pub collection: Address,
    /// Collection name, when indexed
    pub collection_name: Option<String>,
    /// Collection symbol, when indexed
    pub collection_symbol: Option<String>,
    /// Token id
    pub token_id: U256,
    /// Metadata URI, when indexed
    pub uri: Option<String>,
}

#[derive(Deserialize)]
struct CollectionRef {
    id: Address,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NftRow {
    #[serde(deserialize_with = "token_id")]
    token_id: U256,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Deserialize)]
struct OwnedNftRow {
    #[serde(flatten)]
    nft: NftRow,
    collection: CollectionRef,
}

#[derive(Deserialize)]
struct CollectionRow {
    #[serde(flatten)]
    collection: CollectionRef,
    nfts: Vec<NftRow>,
}

fn token_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = String::deserialize(deserializer)?;
    U256::from_str_radix(raw.trim(), 10).map_err(de::Error::custom)
}

impl Nft {
    fn from_parts(collection: &CollectionRef, row: NftRow) -> Self {
        Nft {
            collection: collection.id,
            collection_name: collection.name.clone(),
            collection_symbol: collection.symbol.clone(),
            token_id: row.token_id,
            uri: row.uri,
        }
    }
}

/// NFTs held by an owner, optionally restricted to one collection
///
/// When a collection is given and a chain's indexer does not know it, the
/// chain fails terminally: the collection is not indexed there, and retrying
/// cannot change that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftOwnershipQuery {
    owner: Address,
    collection: Option<Address>,
}

impl NftOwnershipQuery {
    /// All NFTs held by `owner`
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            collection: None,
        }
    }

    /// Only NFTs of `collection`
    #[must_use]
    pub fn in_collection(mut self, collection: Address) -> Self {
        self.collection = Some(collection);
        self
    }
}

impl ChainQuery for NftOwnershipQuery {
    type Record = Nft;

    fn logical_query(&self) -> LogicalQuery {
        let query = LogicalQuery::new(QueryKind::NftOwnership).with_param("owner", self.owner);
        match self.collection {
            Some(collection) => query.with_param("collection", collection),
            None => query,
        }
    }

    fn request(&self, endpoint: &ChainEndpoint) -> Option<QueryRequest> {
        let document = if self.collection.is_some() {
            COLLECTION_NFTS_DOCUMENT
        } else {
            OWNED_NFTS_DOCUMENT
        };
        QueryRequest::indexer(endpoint, document, &self.logical_query())
    }

    fn decode(
        &self,
        _endpoint: &ChainEndpoint,
        response: QueryResponse,
    ) -> Result<Vec<Nft>, DecodeError> {
        let mut data = indexer_data(response)?;

        let Some(collection) = self.collection else {
            let rows: Vec<OwnedNftRow> = required_field(&mut data, "nfts")?;
            return Ok(rows
                .into_iter()
                .map(|row| Nft::from_parts(&row.collection, row.nft))
                .collect());
        };

        match data.get_mut("collection").map(Value::take) {
            None => Err(DecodeError::malformed("missing field `collection`")),
            Some(Value::Null) => Err(DecodeError::unsupported(format!(
                "collection {collection:#x}"
            ))),
            Some(value) => {
                let row: CollectionRow = serde_json::from_value(value)?;
                Ok(row
                    .nfts
                    .into_iter()
                    .map(|nft| Nft::from_parts(&row.collection, nft))
                    .collect())
            }
        }
    }
}
