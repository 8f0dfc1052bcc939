// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for type safety across multiscan.
//!
//! - Raw on-chain amounts and their fixed-point normalization
//! - Token decimals

pub mod amount;

// Note: Public types are re-exported from lib.rs, not here
