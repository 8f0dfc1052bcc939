// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for loading the chain registry.

use std::path::PathBuf;

use crate::chain::ChainId;

/// Errors that can occur while building a [`ChainRegistry`](crate::ChainRegistry).
///
/// The registry is built once at startup; every variant here is a
/// configuration mistake that should stop the process from starting.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The JSON registry source could not be parsed.
    #[error("Invalid registry source")]
    InvalidSource {
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The registry file could not be read.
    #[error("Failed to read registry file {path}")]
    Io {
        /// Path of the registry file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The same chain was configured twice.
    #[error("Chain {chain_id} is configured more than once")]
    DuplicateChain {
        /// The duplicated chain
        chain_id: ChainId,
    },
}
