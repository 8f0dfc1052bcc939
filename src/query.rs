// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain-independent query identity
//!
//! A [`LogicalQuery`] says *what* to fetch (query kind plus parameters) without
//! saying where. Together with a [`ChainScope`] it forms the cache key of the
//! refresh scheduler.
//!
//! Parameters are canonicalized when they are added: addresses and other
//! `0x`-prefixed identifiers are lower-cased. Indexers match entity ids
//! case-sensitively, so an address bound in checksum case would silently match
//! nothing. Canonicalizing at insertion also makes `0xABC…` and `0xabc…`
//! share one cache entry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::ChainId;

/// The kinds of data the aggregation layer knows how to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Lending pools listed by the indexer
    Pools,
    /// An account's supply/borrow positions
    Positions,
    /// Token balances read from contracts
    Balances,
    /// Bridge transfers sent by an account
    BridgeTransactions,
    /// NFTs held by an owner
    NftOwnership,
}

impl QueryKind {
    /// Every query kind
    pub const ALL: [QueryKind; 5] = [
        QueryKind::Pools,
        QueryKind::Positions,
        QueryKind::Balances,
        QueryKind::BridgeTransactions,
        QueryKind::NftOwnership,
    ];

    /// Stable snake_case name
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Pools => "pools",
            QueryKind::Positions => "positions",
            QueryKind::Balances => "balances",
            QueryKind::BridgeTransactions => "bridge_transactions",
            QueryKind::NftOwnership => "nft_ownership",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown query kind name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown query kind {0:?}")]
pub struct UnknownQueryKind(pub String);

impl FromStr for QueryKind {
    type Err = UnknownQueryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownQueryKind(s.to_string()))
    }
}

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// An EVM address, bound lower-case
    Address(Address),
    /// Free text or an identifier
    Text(String),
    /// An unsigned integer
    Number(u64),
    /// A flag
    Bool(bool),
}

impl QueryParam {
    /// Canonical form of this parameter
    ///
    /// Text holding a full address becomes [`QueryParam::Address`]. Other
    /// `0x`-prefixed text is trimmed and lower-cased; everything else is
    /// already canonical.
    #[must_use]
    pub fn canonical(self) -> Self {
        match self {
            QueryParam::Text(text) => {
                let trimmed = text.trim();
                let hex = trimmed.len() > 2
                    && trimmed
                        .get(..2)
                        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("0x"));
                if hex {
                    match trimmed.parse::<Address>() {
                        Ok(address) => QueryParam::Address(address),
                        Err(_) => QueryParam::Text(trimmed.to_ascii_lowercase()),
                    }
                } else if trimmed.len() == text.len() {
                    QueryParam::Text(text)
                } else {
                    QueryParam::Text(trimmed.to_string())
                }
            }
            other => other,
        }
    }

    /// JSON value bound into an indexer query
    pub fn to_variable(&self) -> Value {
        match self.clone().canonical() {
            QueryParam::Address(address) => Value::String(format!("{address:#x}")),
            QueryParam::Text(text) => Value::String(text),
            QueryParam::Number(n) => Value::from(n),
            QueryParam::Bool(b) => Value::Bool(b),
        }
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParam::Address(address) => write!(f, "{address:#x}"),
            QueryParam::Text(text) => f.write_str(text),
            QueryParam::Number(n) => write!(f, "{n}"),
            QueryParam::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<Address> for QueryParam {
    fn from(value: Address) -> Self {
        QueryParam::Address(value)
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        QueryParam::Text(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        QueryParam::Text(value)
    }
}

impl From<u64> for QueryParam {
    fn from(value: u64) -> Self {
        QueryParam::Number(value)
    }
}

impl From<bool> for QueryParam {
    fn from(value: bool) -> Self {
        QueryParam::Bool(value)
    }
}

/// What to fetch, independent of which chain serves it
///
/// Immutable once built; equality and hashing cover the kind and every
/// (canonicalized) parameter.
///
/// # Examples
///
/// ```rust
/// use multiscan::{LogicalQuery, QueryKind};
///
/// let upper = LogicalQuery::new(QueryKind::Positions).with_param("account", "0xABCDEF");
/// let lower = LogicalQuery::new(QueryKind::Positions).with_param("account", "0xabcdef");
/// assert_eq!(upper, lower);
/// assert_eq!(upper.variables()["account"], "0xabcdef");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LogicalQuery {
    kind: QueryKind,
    params: BTreeMap<String, QueryParam>,
}

impl LogicalQuery {
    /// Create a query with no parameters
    #[must_use]
    pub fn new(kind: QueryKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter, canonicalizing its value
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<QueryParam>) -> Self {
        self.params.insert(name.into(), value.into().canonical());
        self
    }

    /// The query kind
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Look up a parameter
    pub fn param(&self, name: &str) -> Option<&QueryParam> {
        self.params.get(name)
    }

    /// All parameters, ordered by name
    pub fn params(&self) -> &BTreeMap<String, QueryParam> {
        &self.params
    }

    /// Parameters as indexer query variables
    pub fn variables(&self) -> Map<String, Value> {
        self.params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_variable()))
            .collect()
    }
}

impl fmt::Display for LogicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

/// Which chains an aggregation targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ChainScope {
    /// Every configured chain with a usable endpoint
    #[default]
    All,
    /// Only the listed chains
    Only(BTreeSet<ChainId>),
}

impl ChainScope {
    /// Scope to exactly one chain; failures of that chain propagate
    #[must_use]
    pub fn single(chain: impl Into<ChainId>) -> Self {
        ChainScope::Only(BTreeSet::from([chain.into()]))
    }

    /// Scope to a set of chains
    #[must_use]
    pub fn only(chains: impl IntoIterator<Item = ChainId>) -> Self {
        ChainScope::Only(chains.into_iter().collect())
    }

    /// Whether the scope names exactly one chain
    pub fn is_single_chain(&self) -> bool {
        matches!(self, ChainScope::Only(chains) if chains.len() == 1)
    }

    /// Whether a chain is inside the scope
    pub fn includes(&self, chain: ChainId) -> bool {
        match self {
            ChainScope::All => true,
            ChainScope::Only(chains) => chains.contains(&chain),
        }
    }
}

impl fmt::Display for ChainScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainScope::All => f.write_str("all"),
            ChainScope::Only(chains) => {
                let ids: Vec<String> = chains.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", ids.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_address_binds_lower_case() {
        let owner = address!("AbCdEf0123456789aBcDeF0123456789AbCdEf01");
        let query = LogicalQuery::new(QueryKind::NftOwnership).with_param("owner", owner);

        assert_eq!(
            query.variables()["owner"],
            Value::String("0xabcdef0123456789abcdef0123456789abcdef01".to_string())
        );
    }

    #[test]
    fn test_hex_text_is_lower_cased_and_trimmed() {
        let query = LogicalQuery::new(QueryKind::Positions).with_param("account", " 0xABC123 ");
        assert_eq!(
            query.param("account"),
            Some(&QueryParam::Text("0xabc123".to_string()))
        );
    }

    #[test]
    fn test_address_text_becomes_address() {
        let typed = address!("AbCdEf0123456789aBcDeF0123456789AbCdEf01");
        let query = LogicalQuery::new(QueryKind::Positions)
            .with_param("account", "0xABCDEF0123456789ABCDEF0123456789ABCDEF01");
        assert_eq!(query.param("account"), Some(&QueryParam::Address(typed)));
    }

    #[test]
    fn test_plain_text_keeps_case() {
        let query = LogicalQuery::new(QueryKind::Pools).with_param("symbol", "USDC");
        assert_eq!(query.variables()["symbol"], "USDC");
    }

    #[test]
    fn test_case_variants_share_identity() {
        let a = LogicalQuery::new(QueryKind::Positions).with_param("account", "0xABCDEF");
        let b = LogicalQuery::new(QueryKind::Positions).with_param("account", "0xabcdef");
        assert_eq!(a, b);
    }

    #[test]
    fn test_numbers_and_flags_bind_as_json() {
        let query = LogicalQuery::new(QueryKind::Pools)
            .with_param("first", 100u64)
            .with_param("active", true);
        let vars = query.variables();
        assert_eq!(vars["first"], Value::from(100u64));
        assert_eq!(vars["active"], Value::Bool(true));
    }

    #[test]
    fn test_display() {
        let query = LogicalQuery::new(QueryKind::Pools).with_param("first", 10u64);
        assert_eq!(query.to_string(), "pools{first=10}");
        assert_eq!(LogicalQuery::new(QueryKind::Balances).to_string(), "balances");
    }

    #[test]
    fn test_query_kind_from_str() {
        for kind in QueryKind::ALL {
            assert_eq!(kind.as_str().parse::<QueryKind>().unwrap(), kind);
        }
        assert!("prices".parse::<QueryKind>().is_err());
    }

    #[test]
    fn test_chain_scope() {
        let single = ChainScope::single(ChainId::SEPOLIA);
        assert!(single.is_single_chain());
        assert!(single.includes(ChainId::SEPOLIA));
        assert!(!single.includes(ChainId::BASE_SEPOLIA));

        let pair = ChainScope::only([ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]);
        assert!(!pair.is_single_chain());
        assert!(!ChainScope::All.is_single_chain());
        assert!(ChainScope::All.includes(ChainId::new(1)));
    }
}
