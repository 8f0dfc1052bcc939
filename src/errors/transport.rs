// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the indexer and contract read transports.

use crate::chain::ChainId;
use crate::transport::GraphQlError;

/// Errors that can occur when executing a query against an indexer endpoint.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    /// The HTTP request could not be sent or the connection failed.
    #[error("Indexer request failed")]
    Http {
        /// The underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The indexer answered with a non-success HTTP status.
    #[error("Indexer returned HTTP status {status}")]
    Status {
        /// The HTTP status code
        status: u16,
    },

    /// The response body was not a valid GraphQL response.
    #[error("Failed to decode indexer response")]
    Decode {
        /// The underlying decode error
        #[source]
        source: reqwest::Error,
    },

    /// The indexer decoded the request but reported errors.
    #[error("Indexer reported {} error(s): {}", .errors.len(), first_message(.errors))]
    Backend {
        /// Errors as reported by the indexer
        errors: Vec<GraphQlError>,
    },

    /// The response carried neither data nor errors.
    #[error("Indexer response contained no data")]
    MissingData,
}

fn first_message(errors: &[GraphQlError]) -> &str {
    errors.first().map_or("", |error| error.message.as_str())
}

impl IndexerError {
    /// Helper to create an `Http` error.
    pub fn http(source: reqwest::Error) -> Self {
        IndexerError::Http { source }
    }

    /// Helper to create a `Decode` error.
    pub fn decode(source: reqwest::Error) -> Self {
        IndexerError::Decode { source }
    }

    /// Helper to create a `Backend` error.
    pub fn backend(errors: Vec<GraphQlError>) -> Self {
        IndexerError::Backend { errors }
    }
}

/// Errors that can occur when reading from a contract over RPC.
#[derive(Debug, thiserror::Error)]
pub enum ContractCallError {
    /// No RPC provider is configured for the chain.
    #[error("No RPC provider configured for chain {chain}")]
    NoProvider {
        /// The chain without a provider
        chain: ChainId,
    },

    /// The function signature could not be parsed.
    #[error("Invalid function signature {signature:?}: {reason}")]
    InvalidSignature {
        /// The signature as given
        signature: String,
        /// Parser error details
        reason: String,
    },

    /// The arguments could not be ABI-encoded for the function.
    #[error("Failed to encode arguments for {signature}: {reason}")]
    Encode {
        /// The function signature
        signature: String,
        /// Encoder error details
        reason: String,
    },

    /// The call reverted.
    #[error("Call to {signature} reverted: {reason}")]
    Reverted {
        /// The function signature
        signature: String,
        /// Revert message reported by the node
        reason: String,
    },

    /// The RPC transport failed.
    #[error("RPC transport failed during {signature}")]
    Transport {
        /// The function signature
        signature: String,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The return data could not be decoded.
    #[error("Failed to decode return data of {signature}: {reason}")]
    Decode {
        /// The function signature
        signature: String,
        /// Decoder error details
        reason: String,
    },
}

impl ContractCallError {
    /// Helper to create an `InvalidSignature` error.
    pub fn invalid_signature(signature: &str, reason: impl std::fmt::Display) -> Self {
        ContractCallError::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Helper to create an `Encode` error.
    pub fn encode(signature: &str, reason: impl std::fmt::Display) -> Self {
        ContractCallError::Encode {
            signature: signature.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Helper to create a `Reverted` error.
    pub fn reverted(signature: &str, reason: impl Into<String>) -> Self {
        ContractCallError::Reverted {
            signature: signature.to_string(),
            reason: reason.into(),
        }
    }

    /// Helper to create a `Transport` error from any error type.
    pub fn transport(
        signature: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ContractCallError::Transport {
            signature: signature.to_string(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `Decode` error.
    pub fn decode(signature: &str, reason: impl std::fmt::Display) -> Self {
        ContractCallError::Decode {
            signature: signature.to_string(),
            reason: reason.to_string(),
        }
    }
}
