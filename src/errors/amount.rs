// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for fixed-point amount normalization.

/// Errors that can occur when parsing a raw integer amount.
///
/// Indexers encode on-chain integers as decimal strings. Anything that is not
/// a non-negative base-10 integer fitting in 256 bits is rejected here rather
/// than silently coerced to zero.
///
/// # Examples
///
/// ```rust
/// use multiscan::{normalize_amount, AmountError};
///
/// match normalize_amount("-5", 18) {
///     Err(AmountError::Negative { raw }) => assert_eq!(raw, "-5"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The raw value is not a base-10 integer.
    #[error("Invalid raw amount {raw:?}: {reason}")]
    InvalidRaw {
        /// The offending input
        raw: String,
        /// Why it was rejected
        reason: String,
    },

    /// The raw value is negative. Token amounts are unsigned on-chain.
    #[error("Negative raw amount {raw:?}")]
    Negative {
        /// The offending input
        raw: String,
    },
}

impl AmountError {
    /// Create an `InvalidRaw` error with details.
    pub fn invalid_raw(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        AmountError::InvalidRaw {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}
