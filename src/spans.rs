// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for multiscan operations.
//!
//! Telemetry is kept out of the business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here. Async work
//! is wrapped with [`Instrument`](tracing::Instrument) so the span follows the
//! future across await points.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(span)
//!     .await
//! }
//! ```

use tracing::Span;

use crate::chain::ChainId;
use crate::query::{ChainScope, LogicalQuery};

/// Create span for one fan-out aggregation.
///
/// Parent: refresh span when triggered by the scheduler, otherwise none
/// Children: fetch_chain spans (one per target chain)
#[inline]
pub(crate) fn aggregate(query: &LogicalQuery, scope: &ChainScope, chains: usize) -> Span {
    tracing::info_span!(
        "multiscan.aggregate",
        query = %query,
        scope = %scope,
        chains = chains,
    )
}

/// Create span for fetching one chain's contribution, retries included.
///
/// Parent: aggregate span
#[inline]
pub(crate) fn fetch_chain(chain: ChainId, backend: &'static str) -> Span {
    tracing::debug_span!(
        "multiscan.fetch_chain",
        chain_id = %chain,
        backend = backend,
    )
}

/// Create span for a scheduler-driven refresh of one cache key.
///
/// Children: aggregate span
#[inline]
pub(crate) fn refresh(query: &LogicalQuery, scope: &ChainScope) -> Span {
    tracing::debug_span!("multiscan.refresh", query = %query, scope = %scope)
}
