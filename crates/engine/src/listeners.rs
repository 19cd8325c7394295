// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Listener pools for long-lived subscriptions.

use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::time::Instant;

use crate::config::PoolConfig;
use crate::error::Result;
use crate::monitor::PerformanceMonitor;
use crate::pool::{PoolHandle, PoolKind, PoolManager, PoolStatistics};
use crate::remote::{Filter, RemoteStore, RemoteUpdate, UpdateStream};

/// Bounds concurrent subscriptions per resource path.
///
/// A subscription holds its slot for its whole life, so the metrics
/// record set-up latency instead of how long the slot was held.
pub struct ListenerPoolManager {
    pools: PoolManager,
    monitor: Arc<PerformanceMonitor>,
}

impl ListenerPoolManager {
    pub fn new(config: &PoolConfig, monitor: Arc<PerformanceMonitor>) -> Self {
        ListenerPoolManager {
            pools: PoolManager::new(
                PoolKind::Listener,
                config.max_listeners,
                config.listener_overrides.clone(),
                config.acquire_timeout(),
                Arc::clone(&monitor),
            ),
            monitor,
        }
    }

    pub fn pools(&self) -> &PoolManager {
        &self.pools
    }

    /// Opens a subscription once a listener slot is free.
    pub async fn subscribe(
        &self,
        remote: &dyn RemoteStore,
        resource_path: &str,
        filters: Vec<Filter>,
    ) -> Result<ListenerSubscription> {
        let mut slot = self.pools.acquire(resource_path).await?;
        slot.skip_report();

        let started = Instant::now();
        let opened = remote.subscribe(resource_path, filters).await;
        let setup = started.elapsed();
        match opened {
            Ok(updates) => {
                self.monitor.record_execution(resource_path, setup, true, 0);
                tracing::debug!(resource = resource_path, "subscription opened");
                Ok(ListenerSubscription { updates, slot })
            }
            Err(e) => {
                self.monitor.record_execution(resource_path, setup, false, 0);
                Err(e.into())
            }
        }
    }

    pub fn statistics(&self) -> Vec<PoolStatistics> {
        self.pools.statistics()
    }

    /// Drops pools with no live subscription and no waiter.
    pub fn prune_idle(&self) -> usize {
        self.pools.prune_idle()
    }
}

/// An open subscription. The listener slot is freed when this is dropped.
pub struct ListenerSubscription {
    updates: UpdateStream,
    slot: PoolHandle,
}

impl ListenerSubscription {
    pub fn resource_path(&self) -> &str {
        self.slot.resource_path()
    }

    pub fn unsubscribe(self) {}
}

impl Stream for ListenerSubscription {
    type Item = RemoteUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<RemoteUpdate>> {
        self.updates.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ListenerSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSubscription").field("slot", &self.slot).finish()
    }
}
