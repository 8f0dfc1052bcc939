// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Background refresh of subscribed keys

use tokio::task::JoinHandle;
use std::future::pending;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, Instrument};

use super::QueryHandle;
use crate::executor::ChainQuery;
use crate::spans;

/// Keeps a key refreshed while alive
///
/// Dropping the subscription stops its periodic refresh. A refresh that is
/// already in flight still completes and updates the cache.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(super) fn spawn<Q: ChainQuery>(handle: QueryHandle<Q>) -> Self {
        let span = spans::refresh(handle.key().query(), handle.key().scope());
        let task = tokio::spawn(run(handle).instrument(span));
        Self { task }
    }

    /// Whether the refresh loop is still running
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<Q: ChainQuery>(handle: QueryHandle<Q>) {
    let policy = handle.policy();
    let mut visibility = handle.visibility();

    let mut ticks = ticker(policy.refresh_interval);
    if ticks.is_none() {
        debug!("Zero refresh interval, refreshing on focus only");
    }

    loop {
        tokio::select! {
            () = next_tick(&mut ticks) => {
                if *visibility.borrow() || policy.always_live {
                    handle.refresh_in_background();
                } else {
                    debug!("View hidden, skipping periodic refresh");
                }
            }
            changed = visibility.changed() => {
                if changed.is_err() {
                    // Scheduler dropped
                    return;
                }
                let visible = *visibility.borrow_and_update();
                if visible && handle.needs_refresh().await {
                    debug!("View visible again, refreshing stale key");
                    handle.refresh_in_background();
                }
            }
        }
    }
}

/// Periodic ticker, or `None` when periodic refresh is disabled
fn ticker(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticks)
}

async fn next_tick(ticks: &mut Option<Interval>) {
    match ticks {
        Some(ticks) => {
            ticks.tick().await;
        }
        None => pending().await,
    }
}
