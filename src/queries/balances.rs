// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Token balances read from contracts

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::chain::ChainEndpoint;
use crate::errors::DecodeError;
use crate::executor::{ChainQuery, QueryRequest, QueryResponse};
use crate::query::{LogicalQuery, QueryKind};
use crate::transport::ContractCall;
use crate::types::amount::{RawAmount, TokenDecimals};

const BALANCE_OF: &str = "balanceOf(address) returns (uint256)";
const DECIMALS: &str = "decimals() returns (uint8)";

/// An account's balance of one token on one chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBalance {
    /// Registry name of the token (e.g. `"usdc"`)
    pub token: String,
    /// Token contract on this chain
    pub address: Address,
    /// Balance holder
    pub account: Address,
    /// Balance in the token's smallest unit
    pub raw: RawAmount,
    /// Token decimals as reported by the contract
    pub decimals: TokenDecimals,
    /// Balance in whole tokens
    pub amount: BigDecimal,
}

/// Balance of a named token for one account
///
/// The token is resolved per chain through the registry's contract map, so
/// `"usdc"` reads each chain's own USDC deployment. Chains without the token
/// or without an RPC endpoint are left out. Pair with
/// [`ChainScope::single`](crate::ChainScope::single) to read one chain and
/// have its failure propagate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceQuery {
    token: String,
    account: Address,
}

impl TokenBalanceQuery {
    /// Balance of the registry token `token` held by `account`
    pub fn new(token: impl Into<String>, account: Address) -> Self {
        Self {
            token: token.into(),
            account,
        }
    }
}

impl ChainQuery for TokenBalanceQuery {
    type Record = TokenBalance;

    fn logical_query(&self) -> LogicalQuery {
        LogicalQuery::new(QueryKind::Balances)
            .with_param("token", self.token.as_str())
            .with_param("account", self.account)
    }

    fn request(&self, endpoint: &ChainEndpoint) -> Option<QueryRequest> {
        let token = endpoint.contract(&self.token)?;
        QueryRequest::contract(
            endpoint,
            vec![
                ContractCall::new(token, BALANCE_OF, vec![DynSolValue::Address(self.account)]),
                ContractCall::new(token, DECIMALS, vec![]),
            ],
        )
    }

    fn decode(
        &self,
        endpoint: &ChainEndpoint,
        response: QueryResponse,
    ) -> Result<Vec<TokenBalance>, DecodeError> {
        let QueryResponse::Contract(outputs) = response else {
            return Err(DecodeError::malformed(
                "expected contract outputs, got an indexer response",
            ));
        };
        let address = endpoint
            .contract(&self.token)
            .ok_or_else(|| DecodeError::unsupported(format!("token {}", self.token)))?;

        let [balance, decimals] = outputs.as_slice() else {
            return Err(DecodeError::malformed(format!(
                "expected 2 call results, got {}",
                outputs.len()
            )));
        };

        let raw = RawAmount::new(single_uint(balance, BALANCE_OF)?);
        let decimals = u8::try_from(single_uint(decimals, DECIMALS)?)
            .map(TokenDecimals::new)
            .map_err(|_| DecodeError::malformed("decimals does not fit in uint8"))?;

        Ok(vec![TokenBalance {
            token: self.token.clone(),
            address,
            account: self.account,
            raw,
            decimals,
            amount: raw.normalize(decimals),
        }])
    }
}

fn single_uint(values: &[DynSolValue], signature: &str) -> Result<U256, DecodeError> {
    match values {
        [DynSolValue::Uint(value, _)] => Ok(*value),
        _ => Err(DecodeError::malformed(format!(
            "unexpected return values from {signature}: {values:?}"
        ))),
    }
}
