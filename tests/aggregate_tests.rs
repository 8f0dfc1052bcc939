// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for fan-out aggregation
//!
//! These tests drive [`Aggregator`] through scripted transports and check
//! chain tagging, partial failure, single-chain propagation and retry
//! classification end to end.

mod helpers;

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use helpers::*;
use multiscan::{
    ChainEndpoint, ChainId, ChainRegistry, ChainScope, FailureKind, PoolsQuery, PositionsQuery,
    TokenBalanceQuery,
};
use serde_json::Value;
use tokio::time::Instant;

const MAINNET: ChainId = ChainId::new(1);

#[tokio::test]
async fn test_every_record_is_tagged_with_its_chain() {
    let indexer = Arc::new(
        MockIndexer::new()
            .with_reply(indexer_url(ChainId::SEPOLIA), pools_data(&["a", "b"]))
            .with_reply(indexer_url(ChainId::BASE_SEPOLIA), pools_data(&["c"]))
            .with_reply(indexer_url(MAINNET), pools_data(&[])),
    );
    let aggregator = aggregator(
        registry(&[MAINNET, ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::All)
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(result.failed_chains.is_empty());
    assert_eq!(
        result.chains(),
        BTreeSet::from([ChainId::SEPOLIA, ChainId::BASE_SEPOLIA])
    );

    let sepolia: Vec<_> = result
        .records_for(ChainId::SEPOLIA)
        .map(|pool| pool.id.as_str())
        .collect();
    assert_eq!(sepolia, vec!["a", "b"], "per-chain order is preserved");

    let pool = result.records_for(ChainId::BASE_SEPOLIA).next().unwrap();
    assert_eq!(pool.total_supplied, BigDecimal::from_str("1.5").unwrap());
    assert_eq!(pool.total_borrowed, BigDecimal::from_str("0.25").unwrap());

    assert_eq!(indexer.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failing_chain_is_reported_not_fatal() {
    let indexer = Arc::new(
        MockIndexer::new()
            .with_reply(indexer_url(ChainId::SEPOLIA), pools_data(&["a"]))
            .with_reply(indexer_url(ChainId::BASE_SEPOLIA), IndexerReply::Status(503)),
    );
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::All)
        .await
        .unwrap();

    assert!(result.is_partial());
    assert_eq!(result.failed_chains, BTreeSet::from([ChainId::BASE_SEPOLIA]));
    assert_eq!(result.chains(), BTreeSet::from([ChainId::SEPOLIA]));

    // One attempt plus three retries
    assert_eq!(indexer.calls(&indexer_url(ChainId::BASE_SEPOLIA)), 4);
    assert_eq!(indexer.calls(&indexer_url(ChainId::SEPOLIA)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_all_chains_failing_still_returns_a_result() {
    let indexer = Arc::new(
        MockIndexer::new()
            .with_reply(indexer_url(ChainId::SEPOLIA), IndexerReply::Status(502))
            .with_reply(indexer_url(ChainId::BASE_SEPOLIA), IndexerReply::Status(502)),
    );
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]),
        indexer,
        Arc::new(MockContracts::new()),
    );

    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::All)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.failed_chains.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_chain_failure_propagates_after_retries() {
    let indexer = Arc::new(
        MockIndexer::new().with_reply(indexer_url(ChainId::SEPOLIA), IndexerReply::Status(503)),
    );
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let error = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::single(ChainId::SEPOLIA))
        .await
        .unwrap_err();

    assert_eq!(error.chain(), ChainId::SEPOLIA);
    assert_eq!(error.failure_kind(), FailureKind::Transient);
    assert_eq!(indexer.calls(&indexer_url(ChainId::SEPOLIA)), 4);
    assert_eq!(
        indexer.calls(&indexer_url(ChainId::BASE_SEPOLIA)),
        0,
        "out-of-scope chains are never queried"
    );
}

#[tokio::test]
async fn test_terminal_code_is_not_retried() {
    let indexer = Arc::new(
        MockIndexer::new()
            .with_reply(indexer_url(ChainId::SEPOLIA), pools_data(&["a"]))
            .with_reply(
                indexer_url(ChainId::BASE_SEPOLIA),
                IndexerReply::Coded("TOKEN_NOT_INDEXED"),
            ),
    );
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::All)
        .await
        .unwrap();

    assert_eq!(result.failed_chains, BTreeSet::from([ChainId::BASE_SEPOLIA]));
    assert_eq!(indexer.calls(&indexer_url(ChainId::BASE_SEPOLIA)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_backend_code_is_retried() {
    let indexer = Arc::new(MockIndexer::new().with_reply(
        indexer_url(ChainId::SEPOLIA),
        IndexerReply::Coded("INTERNAL"),
    ));
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let error = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::single(ChainId::SEPOLIA))
        .await
        .unwrap_err();

    assert_eq!(error.failure_kind(), FailureKind::Transient);
    assert_eq!(indexer.calls(&indexer_url(ChainId::SEPOLIA)), 4);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_recovers_within_budget() {
    let indexer = Arc::new(MockIndexer::new().with_replies(
        indexer_url(ChainId::SEPOLIA),
        vec![
            IndexerReply::Status(503),
            IndexerReply::Status(429),
            pools_data(&["a"]),
        ],
    ));
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::single(ChainId::SEPOLIA))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(indexer.calls(&indexer_url(ChainId::SEPOLIA)), 3);
}

#[tokio::test]
async fn test_chain_without_indexer_is_excluded_silently() {
    let registry = Arc::new(
        ChainRegistry::from_endpoints([
            endpoint(ChainId::SEPOLIA),
            ChainEndpoint::new(ChainId::BASE_SEPOLIA).with_rpc_url(rpc_url(ChainId::BASE_SEPOLIA)),
        ])
        .unwrap(),
    );
    let indexer = Arc::new(
        MockIndexer::new().with_reply(indexer_url(ChainId::SEPOLIA), pools_data(&["a"])),
    );
    let aggregator = aggregator(registry, indexer.clone(), Arc::new(MockContracts::new()));

    assert_eq!(
        aggregator.target_chains(&PoolsQuery::new(), &ChainScope::All),
        vec![ChainId::SEPOLIA]
    );

    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::All)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert!(!result.is_partial());
    assert_eq!(indexer.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chains_are_queried_concurrently() {
    let indexer = Arc::new(
        MockIndexer::new()
            .with_reply(indexer_url(ChainId::SEPOLIA), pools_data(&["a"]))
            .with_reply(indexer_url(ChainId::BASE_SEPOLIA), pools_data(&["b"]))
            .with_reply(indexer_url(MAINNET), pools_data(&["c"]))
            .with_delay(Duration::from_secs(1)),
    );
    let aggregator = aggregator(
        registry(&[MAINNET, ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]),
        indexer,
        Arc::new(MockContracts::new()),
    );

    let started = Instant::now();
    let result = aggregator
        .aggregate(&PoolsQuery::new(), &ChainScope::All)
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "three one-second fetches should overlap, took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_account_is_sent_lowercased() {
    let indexer = Arc::new(
        MockIndexer::new().with_reply(indexer_url(ChainId::SEPOLIA), empty_positions()),
    );
    let aggregator = aggregator(
        registry(&[ChainId::SEPOLIA]),
        indexer.clone(),
        Arc::new(MockContracts::new()),
    );

    let result = aggregator
        .aggregate(&PositionsQuery::new(account()), &ChainScope::All)
        .await
        .unwrap();
    assert!(result.is_empty());

    let variables = indexer.captured_variables();
    assert_eq!(variables.len(), 1);
    assert_eq!(
        variables[0].get("account"),
        Some(&Value::String(
            "0xabcdef0123456789abcdef0123456789abcdef01".to_string()
        ))
    );
}

#[tokio::test]
async fn test_testnet_usdc_balances() {
    let contracts = Arc::new(
        MockContracts::new()
            .with_reply(
                ChainId::SEPOLIA,
                ContractReply::Balance {
                    raw: 1_234_567,
                    decimals: 6,
                },
            )
            .with_reply(
                ChainId::BASE_SEPOLIA,
                ContractReply::Balance {
                    raw: 5_000_000,
                    decimals: 6,
                },
            ),
    );
    let aggregator = aggregator(
        testnet_registry(),
        Arc::new(MockIndexer::new()),
        contracts.clone(),
    );

    let scope = ChainScope::only([ChainId::SEPOLIA, ChainId::BASE_SEPOLIA]);
    let result = aggregator
        .aggregate(&TokenBalanceQuery::new("usdc", account()), &scope)
        .await
        .unwrap();

    assert!(result.failed_chains.is_empty());
    assert_eq!(result.len(), 2);

    let sepolia = result.records_for(ChainId::SEPOLIA).next().unwrap();
    assert_eq!(sepolia.amount, BigDecimal::from_str("1.234567").unwrap());
    assert_eq!(sepolia.address, multiscan::constants::testnet::SEPOLIA_USDC);

    let base = result.records_for(ChainId::BASE_SEPOLIA).next().unwrap();
    assert_eq!(base.amount, BigDecimal::from(5));
    assert_eq!(base.address, multiscan::constants::testnet::BASE_SEPOLIA_USDC);

    // balanceOf and decimals, once each per chain
    assert_eq!(contracts.calls(ChainId::SEPOLIA), 2);
    assert_eq!(contracts.calls(ChainId::BASE_SEPOLIA), 2);
}

#[tokio::test]
async fn test_reverted_balance_read_is_terminal() {
    let contracts =
        Arc::new(MockContracts::new().with_reply(ChainId::BASE_SEPOLIA, ContractReply::Revert));
    let aggregator = aggregator(
        testnet_registry(),
        Arc::new(MockIndexer::new()),
        contracts.clone(),
    );

    let error = aggregator
        .aggregate(
            &TokenBalanceQuery::new("usdc", account()),
            &ChainScope::single(ChainId::BASE_SEPOLIA),
        )
        .await
        .unwrap_err();

    assert_eq!(error.failure_kind(), FailureKind::Terminal);
    assert_eq!(contracts.calls(ChainId::BASE_SEPOLIA), 2, "no retry");
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_rpc_is_retried() {
    let contracts = Arc::new(
        MockContracts::new()
            .with_reply(
                ChainId::SEPOLIA,
                ContractReply::Balance {
                    raw: 1,
                    decimals: 0,
                },
            )
            .with_reply(ChainId::BASE_SEPOLIA, ContractReply::Unreachable),
    );
    let aggregator = aggregator(
        testnet_registry(),
        Arc::new(MockIndexer::new()),
        contracts.clone(),
    );

    let result = aggregator
        .aggregate(&TokenBalanceQuery::new("usdc", account()), &ChainScope::All)
        .await
        .unwrap();

    assert_eq!(result.failed_chains, BTreeSet::from([ChainId::BASE_SEPOLIA]));
    assert_eq!(contracts.calls(ChainId::BASE_SEPOLIA), 8);
}

#[tokio::test]
async fn test_token_missing_from_registry_targets_no_chain() {
    let aggregator = aggregator(
        testnet_registry(),
        Arc::new(MockIndexer::new()),
        Arc::new(MockContracts::new()),
    );

    let query = TokenBalanceQuery::new("weth", account());
    assert!(aggregator.target_chains(&query, &ChainScope::All).is_empty());

    let result = aggregator.aggregate(&query, &ChainScope::All).await.unwrap();
    assert!(result.is_empty());
    assert!(!result.is_partial());
}
