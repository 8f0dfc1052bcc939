// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for fan-out aggregation.

use super::{FailureKind, FetchError};
use crate::chain::ChainId;

/// Errors surfaced by [`Aggregator::aggregate`](crate::Aggregator::aggregate).
///
/// Multi-chain aggregations never fail: a failing chain is recorded in
/// `failed_chains` instead. Only a query scoped to exactly one chain
/// propagates that chain's failure, after retries are exhausted.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The single chain targeted by the query failed.
    #[error("Chain {chain} failed")]
    ChainFailed {
        /// The chain that failed
        chain: ChainId,
        /// The classified failure
        #[source]
        source: FetchError,
    },
}

impl AggregateError {
    /// Helper to create a `ChainFailed` error.
    pub fn chain_failed(chain: ChainId, source: FetchError) -> Self {
        AggregateError::ChainFailed { chain, source }
    }

    /// The chain whose failure was propagated.
    pub fn chain(&self) -> ChainId {
        match self {
            AggregateError::ChainFailed { chain, .. } => *chain,
        }
    }

    /// Classification of the propagated failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AggregateError::ChainFailed { source, .. } => source.kind(),
        }
    }
}
