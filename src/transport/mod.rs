// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transports consumed by the query executor.
//!
//! Two seams, each a trait so tests and alternative backends can be swapped in:
//!
//! - [`IndexerTransport`]: sends a GraphQL document plus bound variables to an
//!   indexer URL and returns the `data` object. [`HttpIndexerTransport`] is the
//!   reqwest-backed implementation.
//! - [`ContractTransport`]: performs read-only contract calls on a chain.
//!   [`AlloyContractTransport`] holds one alloy HTTP provider per configured
//!   RPC endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use multiscan::transport::{AlloyContractTransport, HttpIndexerTransport};
//! use std::time::Duration;
//!
//! let indexer = HttpIndexerTransport::with_timeout(Duration::from_secs(30))?;
//! let contracts = AlloyContractTransport::from_registry(&registry, Duration::from_secs(30))?;
//! ```

mod contract;
mod indexer;

pub use contract::{AlloyContractTransport, ContractCall, ContractTransport};
pub use indexer::{GraphQlError, HttpIndexerTransport, IndexerTransport};
