// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for multiscan operations
//!
//! This module controls retry behavior, per-query-kind refresh cadence,
//! transport timeouts, and which indexer error codes are terminal.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use multiscan::{MultiscanConfig, QueryKind};
//! use std::time::Duration;
//!
//! let config = MultiscanConfig::default();
//! assert_eq!(config.refresh_policy(QueryKind::Balances).stale_after, Duration::from_secs(10));
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use multiscan::{MultiscanConfigBuilder, QueryKind, RetryPolicy};
//! use std::time::Duration;
//!
//! let config = MultiscanConfigBuilder::with_defaults()
//!     .retry_policy(RetryPolicy::builder().max_retries(5).build())
//!     .refresh_interval(QueryKind::Pools, Duration::from_secs(120))
//!     .always_live(QueryKind::Balances)
//!     .build();
//! ```
//!
//! # Example: Tests and one-shot tools
//!
//! ```rust
//! use multiscan::MultiscanConfig;
//!
//! // No retries
//! let config = MultiscanConfig::minimal();
//! assert_eq!(config.retry.max_retries, 0);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::query::QueryKind;
use crate::retry::RetryPolicy;

pub mod constants;

use constants::{
    DEFAULT_INDEXER_TIMEOUT, DEFAULT_RPC_TIMEOUT, FAST_REFRESH_INTERVAL, FAST_STALE_AFTER,
    LISTING_REFRESH_INTERVAL, LISTING_STALE_AFTER, TERMINAL_INDEXER_CODES,
};

/// Refresh cadence of one query kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Age after which a cached value is stale and a read triggers a refetch
    pub stale_after: Duration,
    /// Period of the background refresh while a key has subscribers
    ///
    /// Zero disables periodic refresh; subscribed keys then refresh only
    /// when the view becomes visible again.
    pub refresh_interval: Duration,
    /// Keep refreshing while the consuming view is hidden
    pub always_live: bool,
}

impl RefreshPolicy {
    /// Fast-moving data (balances, prices)
    pub const fn fast() -> Self {
        Self {
            stale_after: FAST_STALE_AFTER,
            refresh_interval: FAST_REFRESH_INTERVAL,
            always_live: false,
        }
    }

    /// Indexer-backed listings: fresh until the next interval
    pub const fn listing() -> Self {
        Self {
            stale_after: LISTING_STALE_AFTER,
            refresh_interval: LISTING_REFRESH_INTERVAL,
            always_live: false,
        }
    }
}

/// Configuration for multiscan operations
///
/// Use [`MultiscanConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct MultiscanConfig {
    /// Retry policy wrapped around every per-chain fetch
    /// Default: 3 retries, 1s base delay, 3s cap
    pub retry: RetryPolicy,

    /// Timeout for indexer HTTP requests
    /// Default: 30 seconds
    pub indexer_timeout: Duration,

    /// Timeout for RPC requests
    /// Default: 30 seconds (prevents hanging on unresponsive providers)
    pub rpc_timeout: Duration,

    /// Indexer `extensions.code` values that mark a failure as terminal
    pub terminal_codes: BTreeSet<String>,

    /// Per-kind refresh overrides
    pub refresh_overrides: HashMap<QueryKind, RefreshPolicy>,
}

impl Default for MultiscanConfig {
    fn default() -> Self {
        Self::with_common_defaults()
    }
}

impl MultiscanConfig {
    /// Create config with the defaults used by dashboards
    ///
    /// Balances refresh fast (stale after 10s, refetched every 30s); indexer
    /// listings are considered fresh until their 10 minute interval.
    pub fn with_common_defaults() -> Self {
        Self {
            retry: RetryPolicy::default(),
            indexer_timeout: DEFAULT_INDEXER_TIMEOUT,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            terminal_codes: TERMINAL_INDEXER_CODES
                .iter()
                .map(|code| (*code).to_string())
                .collect(),
            refresh_overrides: HashMap::new(),
        }
    }

    /// Create minimal config with no retries
    ///
    /// Suitable for tests and one-shot tools where a failing chain should be
    /// reported immediately.
    pub fn minimal() -> Self {
        Self {
            retry: RetryPolicy::no_retry(),
            ..Self::with_common_defaults()
        }
    }

    /// Effective refresh policy for a query kind
    ///
    /// Returns the override if set, otherwise the kind's default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use multiscan::{MultiscanConfig, QueryKind, RefreshPolicy};
    ///
    /// let config = MultiscanConfig::default();
    /// assert_eq!(config.refresh_policy(QueryKind::Pools), RefreshPolicy::listing());
    /// assert_eq!(config.refresh_policy(QueryKind::Balances), RefreshPolicy::fast());
    /// ```
    pub fn refresh_policy(&self, kind: QueryKind) -> RefreshPolicy {
        self.refresh_overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_refresh_policy(kind))
    }

    /// Set a per-kind refresh override
    pub fn set_refresh_policy(&mut self, kind: QueryKind, policy: RefreshPolicy) {
        self.refresh_overrides.insert(kind, policy);
    }
}

fn default_refresh_policy(kind: QueryKind) -> RefreshPolicy {
    match kind {
        QueryKind::Balances => RefreshPolicy::fast(),
        QueryKind::Pools
        | QueryKind::Positions
        | QueryKind::BridgeTransactions
        | QueryKind::NftOwnership => RefreshPolicy::listing(),
    }
}

/// Builder for [`MultiscanConfig`]
///
/// # Example
///
/// ```rust
/// use multiscan::{MultiscanConfigBuilder, QueryKind};
/// use std::time::Duration;
///
/// let config = MultiscanConfigBuilder::new()
///     .indexer_timeout(Duration::from_secs(10))
///     .stale_after(QueryKind::Positions, Duration::from_secs(60))
///     .build();
///
/// assert_eq!(config.indexer_timeout, Duration::from_secs(10));
/// assert_eq!(
///     config.refresh_policy(QueryKind::Positions).stale_after,
///     Duration::from_secs(60)
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MultiscanConfigBuilder {
    config: MultiscanConfig,
}

impl Default for MultiscanConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiscanConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: MultiscanConfig::minimal(),
        }
    }

    /// Start with common defaults
    ///
    /// Initializes the builder with the same defaults as [`MultiscanConfig::with_common_defaults`].
    pub fn with_defaults() -> Self {
        Self {
            config: MultiscanConfig::with_common_defaults(),
        }
    }

    /// Set the retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the indexer request timeout
    pub fn indexer_timeout(mut self, timeout: Duration) -> Self {
        self.config.indexer_timeout = timeout;
        self
    }

    /// Set the RPC request timeout
    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.config.rpc_timeout = timeout;
        self
    }

    /// Mark an indexer error code as terminal
    pub fn terminal_code(mut self, code: impl Into<String>) -> Self {
        self.config.terminal_codes.insert(code.into());
        self
    }

    /// Replace the refresh policy of a query kind
    pub fn refresh_policy(mut self, kind: QueryKind, policy: RefreshPolicy) -> Self {
        self.config.set_refresh_policy(kind, policy);
        self
    }

    /// Set how long values of a query kind stay fresh
    pub fn stale_after(self, kind: QueryKind, stale_after: Duration) -> Self {
        self.update(kind, |policy| policy.stale_after = stale_after)
    }

    /// Set the background refresh period of a query kind
    pub fn refresh_interval(self, kind: QueryKind, interval: Duration) -> Self {
        self.update(kind, |policy| policy.refresh_interval = interval)
    }

    /// Keep refreshing a query kind while its view is hidden
    pub fn always_live(self, kind: QueryKind) -> Self {
        self.update(kind, |policy| policy.always_live = true)
    }

    fn update(mut self, kind: QueryKind, apply: impl FnOnce(&mut RefreshPolicy)) -> Self {
        let mut policy = self.config.refresh_policy(kind);
        apply(&mut policy);
        self.config.set_refresh_policy(kind, policy);
        self
    }

    /// Build the configuration
    pub fn build(self) -> MultiscanConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MultiscanConfig::default();
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.indexer_timeout, Duration::from_secs(30));
        assert_eq!(config.rpc_timeout, Duration::from_secs(30));
        assert!(config.terminal_codes.contains("UNSUPPORTED_ENTITY"));
    }

    #[test]
    fn test_default_refresh_policies() {
        let config = MultiscanConfig::default();

        let balances = config.refresh_policy(QueryKind::Balances);
        assert_eq!(balances.stale_after, Duration::from_secs(10));
        assert_eq!(balances.refresh_interval, Duration::from_secs(30));

        for kind in [
            QueryKind::Pools,
            QueryKind::Positions,
            QueryKind::BridgeTransactions,
            QueryKind::NftOwnership,
        ] {
            let policy = config.refresh_policy(kind);
            assert_eq!(policy.stale_after, Duration::from_secs(600));
            assert_eq!(policy.refresh_interval, Duration::from_secs(600));
            assert!(!policy.always_live);
        }
    }

    #[test]
    fn test_minimal_config_does_not_retry() {
        assert_eq!(MultiscanConfig::minimal().retry.max_retries, 0);
    }

    #[test]
    fn test_builder_overrides_one_field_at_a_time() {
        let config = MultiscanConfigBuilder::with_defaults()
            .refresh_interval(QueryKind::Balances, Duration::from_secs(5))
            .always_live(QueryKind::Balances)
            .terminal_code("TOKEN_NOT_FOUND")
            .build();

        let balances = config.refresh_policy(QueryKind::Balances);
        assert_eq!(balances.stale_after, Duration::from_secs(10));
        assert_eq!(balances.refresh_interval, Duration::from_secs(5));
        assert!(balances.always_live);
        assert!(config.terminal_codes.contains("TOKEN_NOT_FOUND"));
        assert_eq!(config.refresh_policy(QueryKind::Pools), RefreshPolicy::listing());
    }
}
