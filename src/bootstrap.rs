// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line entry point
//!
//! Runs one aggregation and prints the merged, chain-tagged result as JSON.
//! Configured from the environment (a `.env` file is honored):
//!
//! | Variable             | Meaning                                      | Default |
//! |----------------------|----------------------------------------------|---------|
//! | `MULTISCAN_REGISTRY` | Path to the JSON chain registry              | required |
//! | `MULTISCAN_QUERY`    | Query kind (`pools`, `positions`, ...)        | `pools` |
//! | `MULTISCAN_ACCOUNT`  | Account for account-scoped kinds             | |
//! | `MULTISCAN_TOKEN`    | Contract name for `balances`                 | `usdc` |
//! | `MULTISCAN_CHAIN`    | Restrict to a single chain id                | all chains |

use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::Context;
use dotenvy::dotenv;
use serde::Serialize;
use tracing::info;

use crate::{
    Aggregator, BridgeTransactionsQuery, ChainId, ChainQuery, ChainRegistry, ChainScope,
    MultiscanConfig, NftOwnershipQuery, PoolsQuery, PositionsQuery, QueryKind, TokenBalanceQuery,
};

/// Main entry point for the application.
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let registry_path =
        dotenvy::var("MULTISCAN_REGISTRY").context("MULTISCAN_REGISTRY must be set")?;
    let registry = Arc::new(ChainRegistry::from_json_file(&registry_path).await?);

    let kind: QueryKind = dotenvy::var("MULTISCAN_QUERY")
        .unwrap_or_else(|_| QueryKind::Pools.to_string())
        .parse()?;

    let scope = match dotenvy::var("MULTISCAN_CHAIN") {
        Ok(chain) => ChainScope::single(ChainId::from(
            chain.parse::<u64>().context("MULTISCAN_CHAIN must be a chain id")?,
        )),
        Err(_) => ChainScope::All,
    };

    let config = MultiscanConfig::default();
    let aggregator = Aggregator::connect(registry, &config)?;
    info!(kind = %kind, scope = %scope, "Running aggregation");

    match kind {
        QueryKind::Pools => print(&aggregator, PoolsQuery::new(), &scope).await,
        QueryKind::Positions => {
            print(&aggregator, PositionsQuery::new(account()?), &scope).await
        }
        QueryKind::Balances => {
            let token = dotenvy::var("MULTISCAN_TOKEN").unwrap_or_else(|_| "usdc".to_string());
            print(&aggregator, TokenBalanceQuery::new(token, account()?), &scope).await
        }
        QueryKind::BridgeTransactions => {
            print(&aggregator, BridgeTransactionsQuery::new(account()?), &scope).await
        }
        QueryKind::NftOwnership => {
            print(&aggregator, NftOwnershipQuery::new(account()?), &scope).await
        }
    }
}

fn account() -> anyhow::Result<Address> {
    dotenvy::var("MULTISCAN_ACCOUNT")
        .context("MULTISCAN_ACCOUNT must be set for this query")?
        .parse()
        .context("MULTISCAN_ACCOUNT is not a valid address")
}

async fn print<Q>(aggregator: &Aggregator, query: Q, scope: &ChainScope) -> anyhow::Result<()>
where
    Q: ChainQuery,
    Q::Record: Serialize,
{
    let result = aggregator.aggregate(&query, scope).await?;
    if result.is_partial() {
        info!(failed_chains = ?result.failed_chains, "Some chains were unavailable");
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
