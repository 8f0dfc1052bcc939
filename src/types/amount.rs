// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed-point normalization of raw on-chain integer amounts
//!
//! On-chain amounts are unsigned integers in the token's smallest unit.
//! Indexers ship them as decimal strings (they routinely exceed `u64`), and
//! contract reads return them as `uint256`. This module turns either form into
//! an exact [`BigDecimal`] scaled by the token's decimals. No floating point is
//! involved, so normalizing the same input always yields the same value.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use bigdecimal::num_bigint::{BigInt, BigUint, Sign};
use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AmountError;

/// ERC-20 token decimal precision
///
/// Represents the number of decimal places for a token. Most ERC-20 tokens
/// use 18 decimals (like ETH), but some use different values:
/// - USDC: 6 decimals
/// - WBTC: 8 decimals
/// - Standard: 18 decimals
///
/// Deserializes from either a JSON number or a decimal string, since indexers
/// disagree on how they encode it.
///
/// # Examples
///
/// ```
/// use multiscan::TokenDecimals;
///
/// assert_eq!(TokenDecimals::STANDARD.as_u8(), 18);
/// assert_eq!(TokenDecimals::USDC.as_u8(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TokenDecimals(u8);

impl TokenDecimals {
    /// Maximum reasonable decimals (following ERC-20 convention)
    pub const MAX_REASONABLE: u8 = 18;

    /// Standard decimals for ETH-like tokens (18)
    pub const STANDARD: Self = Self(18);

    /// USDC decimals (6)
    pub const USDC: Self = Self(6);

    /// WBTC decimals (8)
    pub const WBTC: Self = Self(8);

    /// Create a new decimal precision value
    pub const fn new(decimals: u8) -> Self {
        Self(decimals)
    }

    /// Get the inner u8 value
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Check if decimals are in reasonable range (0-18)
    ///
    /// While the ERC-20 standard allows any u8 value, most tokens
    /// use 18 or fewer decimals. Values over 18 are unusual and
    /// may indicate data errors.
    pub const fn is_reasonable(&self) -> bool {
        self.0 <= Self::MAX_REASONABLE
    }
}

impl From<u8> for TokenDecimals {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for TokenDecimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} decimals", self.0)
    }
}

impl<'de> Deserialize<'de> for TokenDecimals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u8),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Self(value)),
            Repr::Text(text) => text
                .trim()
                .parse::<u8>()
                .map(Self)
                .map_err(|e| de::Error::custom(format!("invalid decimals {text:?}: {e}"))),
        }
    }
}

/// Raw token amount in the token's smallest unit
///
/// Serializes as a decimal string and deserializes from one, matching how
/// indexers encode big integers.
///
/// # Examples
///
/// ```
/// use multiscan::{RawAmount, TokenDecimals};
///
/// let raw = RawAmount::parse("1500000000000000000").unwrap();
/// assert_eq!(raw.normalize(TokenDecimals::STANDARD).to_string(), "1.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawAmount(U256);

impl RawAmount {
    /// Zero amount
    pub const ZERO: Self = Self(U256::ZERO);

    /// Create a raw amount from a U256
    pub const fn new(amount: U256) -> Self {
        Self(amount)
    }

    /// Parse a base-10 integer string
    ///
    /// Surrounding whitespace is ignored. Signs, decimal points, exponents and
    /// values above `U256::MAX` are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if the input is not a non-negative integer.
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        let digits = raw.trim();
        if digits.starts_with('-') {
            return Err(AmountError::Negative {
                raw: raw.to_string(),
            });
        }
        if digits.is_empty() {
            return Err(AmountError::invalid_raw(raw, "empty"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::invalid_raw(raw, "not a base-10 integer"));
        }

        U256::from_str_radix(digits, 10)
            .map(Self)
            .map_err(|e| AmountError::invalid_raw(raw, e.to_string()))
    }

    /// Get the inner U256 value
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Normalize by token decimals: `amount / 10^decimals`, exactly
    pub fn normalize(&self, decimals: TokenDecimals) -> BigDecimal {
        let magnitude = BigUint::from_bytes_be(&self.0.to_be_bytes::<32>());
        BigDecimal::new(
            BigInt::from_biguint(Sign::Plus, magnitude),
            i64::from(decimals.as_u8()),
        )
        .normalized()
    }
}

impl From<U256> for RawAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for RawAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for RawAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// Normalize a raw integer string by a decimals count
///
/// This is a pure function: the same inputs always produce the same value.
///
/// # Examples
///
/// ```
/// use multiscan::normalize_amount;
/// use bigdecimal::BigDecimal;
/// use std::str::FromStr;
///
/// let value = normalize_amount("1500000000000000000", 18).unwrap();
/// assert_eq!(value, BigDecimal::from_str("1.5").unwrap());
/// ```
///
/// # Errors
///
/// Returns [`AmountError`] if `raw` is not a non-negative base-10 integer.
pub fn normalize_amount(raw: &str, decimals: u8) -> Result<BigDecimal, AmountError> {
    RawAmount::parse(raw).map(|amount| amount.normalize(TokenDecimals::new(decimals)))
}
