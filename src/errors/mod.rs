// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the multiscan library.
//!
//! This module provides strongly-typed errors for all public APIs in multiscan.
//! It follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained error handling (`RegistryError`,
//!   `AmountError`, `IndexerError`, etc.)
//! - **Unified error type** (`MultiscanError`) for convenience when you don't need
//!   to distinguish between error sources
//!
//! # Architecture
//!
//! Each layer has its own error type:
//! - [`RegistryError`] - Errors loading or building the chain registry
//! - [`AmountError`] - Errors normalizing raw integer amounts
//! - [`IndexerError`] - Errors from the indexer query transport
//! - [`ContractCallError`] - Errors from the contract read transport
//! - [`DecodeError`] - Errors turning a transport response into typed records
//! - [`FetchError`] - A per-chain failure classified by [`FailureKind`]
//! - [`AggregateError`] - A failure surfaced by a single-chain aggregation
//!
//! # Failure classification
//!
//! Every per-chain failure carries a [`FailureKind`] attached at the query
//! executor boundary. The retry policy only ever looks at that kind, never at
//! error messages.
//!
//! ```rust
//! use multiscan::{DecodeError, FailureKind, FetchError};
//!
//! let error = FetchError::from(DecodeError::unsupported("token 0xdead"));
//! assert_eq!(error.kind(), FailureKind::Terminal);
//! ```

mod aggregate;
mod amount;
mod fetch;
mod registry;
mod transport;

pub use aggregate::AggregateError;
pub use amount::AmountError;
pub use fetch::{DecodeError, FailureKind, FetchError, FetchFailure};
pub use registry::RegistryError;
pub use transport::{ContractCallError, IndexerError};

/// Unified error type for all multiscan operations.
///
/// All module-specific error types automatically convert to `MultiscanError` via
/// `From` implementations, so you can use `?` to propagate errors naturally.
#[derive(Debug, thiserror::Error)]
pub enum MultiscanError {
    /// Error from the chain registry.
    #[error("Chain registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Error from amount normalization.
    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    /// Error from the indexer transport.
    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    /// Error from the contract read transport.
    #[error("Contract call error: {0}")]
    Contract(#[from] ContractCallError),

    /// Error from a single per-chain fetch.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from a single-chain aggregation.
    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// An HTTP client for a transport could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
