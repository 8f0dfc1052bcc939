// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-chain fetch failures and their classification.
//!
//! The query executor turns every transport or decode failure into a
//! [`FetchError`] tagged with a [`FailureKind`]. Classification happens once,
//! here, from the structure of the underlying error.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::{AmountError, ContractCallError, IndexerError};

/// Whether a failure can plausibly be resolved by retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network blip, 5xx, rate limit, or a temporarily malformed response.
    Transient,
    /// The backend definitively cannot serve the request (e.g. an unsupported token).
    Terminal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transient => f.write_str("transient"),
            FailureKind::Terminal => f.write_str("terminal"),
        }
    }
}

/// Errors that can occur when turning a transport response into records.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The response does not have the expected shape.
    #[error("Malformed response: {details}")]
    Malformed {
        /// What was wrong with the response
        details: String,
    },

    /// The backend explicitly has no such entity (e.g. a token that is not indexed).
    #[error("Unsupported entity: {entity}")]
    Unsupported {
        /// Description of the missing entity
        entity: String,
    },

    /// A numeric field could not be normalized.
    #[error("Invalid amount in response: {0}")]
    Amount(#[from] AmountError),
}

impl DecodeError {
    /// Create a `Malformed` error with details.
    pub fn malformed(details: impl Into<String>) -> Self {
        DecodeError::Malformed {
            details: details.into(),
        }
    }

    /// Create an `Unsupported` error for an entity.
    pub fn unsupported(entity: impl Into<String>) -> Self {
        DecodeError::Unsupported {
            entity: entity.into(),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(error: serde_json::Error) -> Self {
        DecodeError::malformed(error.to_string())
    }
}

/// The underlying reason for a [`FetchError`].
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    /// The indexer transport failed.
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    /// The contract read transport failed.
    #[error(transparent)]
    Contract(#[from] ContractCallError),

    /// The response could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The endpoint has no backend able to serve the query.
    #[error("Endpoint cannot serve {query}")]
    Unroutable {
        /// The query that could not be routed
        query: String,
    },
}

/// A classified failure of one per-chain query.
///
/// # Examples
///
/// ```rust
/// use multiscan::{FailureKind, FetchError, IndexerError};
///
/// let error = FetchError::from(IndexerError::Status { status: 503 });
/// assert_eq!(error.kind(), FailureKind::Transient);
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{kind} fetch failure: {reason}")]
pub struct FetchError {
    kind: FailureKind,
    #[source]
    reason: FetchFailure,
}

impl FetchError {
    /// Create a transient failure.
    pub fn transient(reason: impl Into<FetchFailure>) -> Self {
        Self {
            kind: FailureKind::Transient,
            reason: reason.into(),
        }
    }

    /// Create a terminal failure.
    pub fn terminal(reason: impl Into<FetchFailure>) -> Self {
        Self {
            kind: FailureKind::Terminal,
            reason: reason.into(),
        }
    }

    /// Classify an indexer error.
    ///
    /// Backend-reported errors are terminal when any of them carries an
    /// `extensions.code` listed in `terminal_codes`. Everything else the
    /// indexer transport can report is transient.
    pub fn from_indexer(error: IndexerError, terminal_codes: &BTreeSet<String>) -> Self {
        let terminal = match &error {
            IndexerError::Backend { errors } => errors
                .iter()
                .filter_map(|e| e.code())
                .any(|code| terminal_codes.contains(code)),
            _ => false,
        };

        if terminal {
            Self::terminal(error)
        } else {
            Self::transient(error)
        }
    }

    /// The failure classification.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Whether the failure must never be retried.
    pub fn is_terminal(&self) -> bool {
        self.kind == FailureKind::Terminal
    }

    /// The underlying reason.
    pub fn reason(&self) -> &FetchFailure {
        &self.reason
    }
}

impl From<IndexerError> for FetchError {
    /// Classifies without any terminal error codes; see [`FetchError::from_indexer`].
    fn from(error: IndexerError) -> Self {
        Self::from_indexer(error, &BTreeSet::new())
    }
}

impl From<ContractCallError> for FetchError {
    fn from(error: ContractCallError) -> Self {
        match error {
            // A bad request or a revert fails the same way on every attempt.
            ContractCallError::NoProvider { .. }
            | ContractCallError::InvalidSignature { .. }
            | ContractCallError::Encode { .. }
            | ContractCallError::Reverted { .. } => Self::terminal(error),
            ContractCallError::Transport { .. } | ContractCallError::Decode { .. } => {
                Self::transient(error)
            }
        }
    }
}

impl From<DecodeError> for FetchError {
    fn from(error: DecodeError) -> Self {
        match error {
            DecodeError::Unsupported { .. } => Self::terminal(error),
            DecodeError::Malformed { .. } | DecodeError::Amount(_) => Self::transient(error),
        }
    }
}
