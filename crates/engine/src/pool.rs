// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded slot pools guarding concurrent remote access per resource path.
//!
//! A [`Pool`] is a FIFO semaphore with bookkeeping. Holding a
//! [`PoolHandle`] means holding a slot; dropping it frees the slot and
//! reports the call to the performance monitor. [`PoolManager`] creates
//! one pool per resource path on first use.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::monitor::PerformanceMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Connection,
    Listener,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PoolKind::Connection => "connection",
            PoolKind::Listener => "listener",
        })
    }
}

#[derive(Debug, Default)]
struct Counters {
    active: usize,
    waiting: usize,
    peak_active: usize,
    total_acquired: u64,
    timeouts: u64,
}

/// Point-in-time view of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatistics {
    pub kind: PoolKind,
    pub resource_path: String,
    pub max_concurrent: usize,
    pub active: usize,
    pub waiting: usize,
    pub peak_active: usize,
    pub total_acquired: u64,
    pub timeouts: u64,
}

pub struct Pool {
    kind: PoolKind,
    resource_path: String,
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
    counters: Mutex<Counters>,
    monitor: Arc<PerformanceMonitor>,
}

impl Pool {
    pub fn new(
        kind: PoolKind,
        resource_path: impl Into<String>,
        max_concurrent: usize,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Pool {
            kind,
            resource_path: resource_path.into(),
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            counters: Mutex::new(Counters::default()),
            monitor,
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Waits for a slot. Waiters are served in arrival order.
    pub async fn acquire(self: &Arc<Self>) -> Result<PoolHandle> {
        self.acquire_inner(None).await
    }

    /// Waits at most `timeout` for a slot.
    ///
    /// On timeout the caller leaves the wait queue and nothing else changes.
    pub async fn acquire_timeout(self: &Arc<Self>, timeout: Duration) -> Result<PoolHandle> {
        self.acquire_inner(Some(timeout)).await
    }

    async fn acquire_inner(self: &Arc<Self>, timeout: Option<Duration>) -> Result<PoolHandle> {
        let waiting = WaitingGuard::enter(self);
        let permit = Arc::clone(&self.semaphore).acquire_owned();
        let permit = match timeout {
            None => permit.await,
            Some(limit) => match tokio::time::timeout(limit, permit).await {
                Ok(permit) => permit,
                Err(_) => {
                    self.counters().timeouts += 1;
                    tracing::warn!(
                        kind = %self.kind,
                        resource = %self.resource_path,
                        waited_ms = limit.as_millis() as u64,
                        "timed out waiting for pool slot"
                    );
                    return Err(Error::PoolTimeout {
                        kind: self.kind,
                        resource_path: self.resource_path.clone(),
                        waited: limit,
                    });
                }
            },
        };
        let permit = permit.map_err(|_| Error::PoolClosed {
            kind: self.kind,
            resource_path: self.resource_path.clone(),
        })?;

        waiting.promote();
        self.monitor.slot_acquired(self.kind);
        Ok(PoolHandle {
            pool: Arc::clone(self),
            permit: Some(permit),
            acquired_at: Instant::now(),
            failed: false,
            result_count: 0,
            report: true,
        })
    }

    /// Returns a slot early. Equivalent to dropping the handle.
    pub fn release(&self, handle: PoolHandle) {
        drop(handle);
    }

    pub fn statistics(&self) -> PoolStatistics {
        let c = self.counters();
        PoolStatistics {
            kind: self.kind,
            resource_path: self.resource_path.clone(),
            max_concurrent: self.max_concurrent,
            active: c.active,
            waiting: c.waiting,
            peak_active: c.peak_active,
            total_acquired: c.total_acquired,
            timeouts: c.timeouts,
        }
    }

    /// True when no slot is held and nobody is waiting.
    pub fn is_empty(&self) -> bool {
        let c = self.counters();
        c.active == 0 && c.waiting == 0
    }
}

/// Counts a caller as waiting until it gets a slot or gives up.
///
/// Dropping the guard without promoting covers timeouts and cancelled
/// futures alike.
struct WaitingGuard<'a> {
    pool: &'a Pool,
    promoted: bool,
}

impl<'a> WaitingGuard<'a> {
    fn enter(pool: &'a Pool) -> Self {
        pool.counters().waiting += 1;
        WaitingGuard { pool, promoted: false }
    }

    fn promote(mut self) {
        let mut c = self.pool.counters();
        c.waiting = c.waiting.saturating_sub(1);
        c.active += 1;
        c.peak_active = c.peak_active.max(c.active);
        c.total_acquired += 1;
        self.promoted = true;
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        if !self.promoted {
            let mut c = self.pool.counters();
            c.waiting = c.waiting.saturating_sub(1);
        }
    }
}

/// A held pool slot.
///
/// Dropping the handle frees the slot and records the call's duration,
/// success, and result count against the pool's resource path.
pub struct PoolHandle {
    pool: Arc<Pool>,
    permit: Option<OwnedSemaphorePermit>,
    acquired_at: Instant,
    failed: bool,
    result_count: usize,
    report: bool,
}

impl PoolHandle {
    pub fn resource_path(&self) -> &str {
        &self.pool.resource_path
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub(crate) fn mark_succeeded(&mut self) {
        self.failed = false;
    }

    pub fn set_result_count(&mut self, count: usize) {
        self.result_count = count;
    }

    /// Release the slot without recording an execution.
    pub(crate) fn skip_report(&mut self) {
        self.report = false;
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("kind", &self.pool.kind)
            .field("resource_path", &self.pool.resource_path)
            .field("held_for", &self.held_for())
            .finish()
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        {
            let mut c = self.pool.counters();
            c.active = c.active.saturating_sub(1);
        }
        // Counters first: the next waiter is woken by this release.
        drop(self.permit.take());
        self.pool.monitor.slot_released(self.pool.kind);
        if self.report {
            self.pool.monitor.record_execution(
                &self.pool.resource_path,
                held,
                !self.failed,
                self.result_count,
            );
        }
    }
}

/// Lazily creates one [`Pool`] per resource path.
pub struct PoolManager {
    kind: PoolKind,
    default_max: usize,
    overrides: HashMap<String, usize>,
    acquire_timeout: Option<Duration>,
    pools: Mutex<BTreeMap<String, Arc<Pool>>>,
    monitor: Arc<PerformanceMonitor>,
}

impl PoolManager {
    pub fn new(
        kind: PoolKind,
        default_max: usize,
        overrides: HashMap<String, usize>,
        acquire_timeout: Option<Duration>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        PoolManager {
            kind,
            default_max,
            overrides,
            acquire_timeout,
            pools: Mutex::new(BTreeMap::new()),
            monitor,
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    fn pools(&self) -> MutexGuard<'_, BTreeMap<String, Arc<Pool>>> {
        self.pools.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The configured bound for `resource_path`.
    pub fn limit_for(&self, resource_path: &str) -> usize {
        self.overrides.get(resource_path).copied().unwrap_or(self.default_max)
    }

    /// Returns the pool for `resource_path`, creating it on first access.
    pub fn pool(&self, resource_path: &str) -> Arc<Pool> {
        let mut pools = self.pools();
        if let Some(pool) = pools.get(resource_path) {
            return Arc::clone(pool);
        }
        let limit = self.limit_for(resource_path);
        tracing::debug!(kind = %self.kind, resource = resource_path, limit, "creating pool");
        let pool = Arc::new(Pool::new(self.kind, resource_path, limit, Arc::clone(&self.monitor)));
        pools.insert(resource_path.to_string(), Arc::clone(&pool));
        pool
    }

    /// Acquires a slot, bounded by the configured acquire timeout if any.
    pub async fn acquire(&self, resource_path: &str) -> Result<PoolHandle> {
        let pool = self.pool(resource_path);
        match self.acquire_timeout {
            Some(timeout) => pool.acquire_timeout(timeout).await,
            None => pool.acquire().await,
        }
    }

    /// Statistics for every pool, ordered by resource path.
    pub fn statistics(&self) -> Vec<PoolStatistics> {
        self.pools().values().map(|pool| pool.statistics()).collect()
    }

    /// Drops pools nobody holds or waits on. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let mut pools = self.pools();
        let before = pools.len();
        pools.retain(|_, pool| Arc::strong_count(pool) > 1 || !pool.is_empty());
        let removed = before - pools.len();
        if removed > 0 {
            tracing::debug!(kind = %self.kind, removed, "pruned idle pools");
        }
        removed
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
