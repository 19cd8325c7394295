// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replays queued operations against the remote store.
//!
//! A drain walks the queue in replay order and applies each operation
//! through the connection pool. Applied operations are acknowledged,
//! conflicting ones are abandoned into the conflict log, and transient
//! failures leave the operation (and every later operation on the same
//! document) queued for the next drain. Going offline mid-drain stops the
//! drain without touching the remaining operations.
//!
//! [`SyncEngine::run`] is the background worker: it drains when the device
//! comes back online, when new work is enqueued, and on an exponential
//! backoff after a failed drain.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};
use tokio::time::Instant;

use harbor_core::{ClockSource, ConflictRecord, OfflineOperation, OperationQueue};

use crate::config::SyncConfig;
use crate::connections::ConnectionPoolManager;
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::remote::{ApplyOutcome, ApplyRequest, RemoteStore};
use crate::status::{SyncStatus, SyncStatusInfo};
use crate::subscription::Subscription;

const STATUS_CAPACITY: usize = 64;

/// Doubling retry delay, capped.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub(crate) fn new(config: &SyncConfig) -> Self {
        let initial = Duration::from_millis(config.retry_initial_delay_ms);
        let max = Duration::from_secs(config.retry_max_delay_secs).max(initial);
        Backoff { initial, max, next: initial }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = std::cmp::min(self.next.saturating_mul(2), self.max);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.next = self.initial;
    }
}

#[derive(Debug, Default)]
struct DrainTally {
    applied: usize,
    conflicts: usize,
    failed: usize,
    first_error: Option<String>,
    aborted: bool,
}

impl DrainTally {
    fn fail(&mut self, error: String) {
        self.failed += 1;
        self.first_error.get_or_insert(error);
    }
}

pub struct SyncEngine {
    queue: Arc<OperationQueue>,
    remote: Arc<dyn RemoteStore>,
    connections: Arc<ConnectionPoolManager>,
    connectivity: ConnectivityMonitor,
    clock: Arc<dyn ClockSource>,
    config: SyncConfig,
    status: Mutex<SyncStatusInfo>,
    status_tx: broadcast::Sender<SyncStatusInfo>,
    conflict_count: AtomicU64,
    draining: tokio::sync::Mutex<()>,
    drain_requested: Notify,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<OperationQueue>,
        remote: Arc<dyn RemoteStore>,
        connections: Arc<ConnectionPoolManager>,
        connectivity: ConnectivityMonitor,
        clock: Arc<dyn ClockSource>,
        config: SyncConfig,
    ) -> Result<Self> {
        let pending_operations = queue.len()?;
        let (status_tx, _) = broadcast::channel(STATUS_CAPACITY);
        Ok(SyncEngine {
            queue,
            remote,
            connections,
            connectivity,
            clock,
            config,
            status: Mutex::new(SyncStatusInfo { pending_operations, ..Default::default() }),
            status_tx,
            conflict_count: AtomicU64::new(0),
            draining: tokio::sync::Mutex::new(()),
            drain_requested: Notify::new(),
        })
    }

    fn status(&self) -> MutexGuard<'_, SyncStatusInfo> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current_status(&self) -> SyncStatusInfo {
        self.status().clone()
    }

    /// Status updates in publish order.
    pub fn status_stream(&self) -> Subscription<SyncStatusInfo> {
        Subscription::new(self.status_tx.subscribe(), "sync_status")
    }

    /// Applies `update` to the current status and publishes the result.
    ///
    /// Publishing happens under the status lock so subscribers see updates
    /// in the order they were made.
    fn publish(&self, update: impl FnOnce(&mut SyncStatusInfo)) -> SyncStatusInfo {
        let mut status = self.status();
        update(&mut status);
        status.conflict_count = self.conflict_count.load(Ordering::SeqCst);
        let snapshot = status.clone();
        let _ = self.status_tx.send(snapshot.clone());
        snapshot
    }

    fn pending_count(&self) -> usize {
        match self.queue.len() {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "failed to count queued operations");
                self.status().pending_operations
            }
        }
    }

    /// Persists `op` and asks the worker to drain.
    pub fn enqueue(&self, op: &OfflineOperation) -> Result<()> {
        self.queue.enqueue(op)?;
        let pending = self.pending_count();
        self.publish(|s| s.pending_operations = pending);
        self.request_drain();
        Ok(())
    }

    /// Wakes the background worker. Coalesces with any pending request.
    pub fn request_drain(&self) {
        self.drain_requested.notify_one();
    }

    pub fn conflicts(&self) -> Result<Vec<ConflictRecord>> {
        Ok(self.queue.conflicts()?)
    }

    pub fn clear_conflicts(&self) -> Result<usize> {
        Ok(self.queue.clear_conflicts()?)
    }

    pub fn reset_conflict_count(&self) {
        self.conflict_count.store(0, Ordering::SeqCst);
        self.publish(|_| {});
    }

    /// Replays the queue once.
    ///
    /// At most one drain runs at a time; a call made while another drain is
    /// in progress returns the current status immediately. Offline calls
    /// return without contacting the remote store.
    pub async fn drain(&self) -> SyncStatusInfo {
        let Ok(_draining) = self.draining.try_lock() else {
            tracing::debug!("drain already in progress");
            return self.current_status();
        };
        if !self.connectivity.is_online() {
            tracing::debug!("offline; drain skipped");
            let pending = self.pending_count();
            return self.publish(|s| s.pending_operations = pending);
        }

        let ops = match self.queue.pending() {
            Ok(ops) => ops,
            Err(e) => {
                tracing::error!(error = %e, "failed to read operation queue");
                return self.publish(|s| {
                    s.status = SyncStatus::Error;
                    s.error_message = Some(format!("failed to read operation queue: {e}"));
                });
            }
        };
        let total = ops.len();
        self.publish(|s| {
            s.status = SyncStatus::Syncing;
            s.pending_operations = total;
            s.error_message = None;
        });
        tracing::info!(pending = total, "drain started");

        let mut tally = DrainTally::default();
        let mut held_back: HashSet<(String, String)> = HashSet::new();

        for op in ops {
            if !self.connectivity.is_online() {
                tally.aborted = true;
                break;
            }
            let document = (op.resource_path.clone(), op.document_id.clone());
            if held_back.contains(&document) {
                tracing::debug!(
                    id = %op.id,
                    document = %op.document_key(),
                    "held behind failed operation"
                );
                continue;
            }

            let apply = self
                .connections
                .execute(&op.resource_path, self.remote.apply(ApplyRequest::from(&op)));
            let result = tokio::select! {
                biased;
                _ = self.connectivity.wait_offline() => None,
                result = apply => Some(result),
            };
            let Some(result) = result else {
                tally.aborted = true;
                break;
            };

            match result {
                Ok(ApplyOutcome::Applied) => match self.queue.acknowledge(&op.id) {
                    Ok(()) => tally.applied += 1,
                    Err(e) => {
                        tracing::error!(id = %op.id, error = %e, "failed to acknowledge operation");
                        tally.fail(e.to_string());
                        held_back.insert(document);
                    }
                },
                Ok(ApplyOutcome::Conflict { server_timestamp }) => {
                    match self.queue.abandon(&op, server_timestamp, self.clock.now()) {
                        Ok(_) => {
                            self.conflict_count.fetch_add(1, Ordering::SeqCst);
                            tally.conflicts += 1;
                        }
                        Err(e) => {
                            tracing::error!(id = %op.id, error = %e, "failed to record conflict");
                            tally.fail(e.to_string());
                            held_back.insert(document);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        id = %op.id,
                        document = %op.document_key(),
                        error = %e,
                        "operation failed; will retry"
                    );
                    tally.fail(e.to_string());
                    held_back.insert(document);
                }
            }
        }

        self.finish(tally)
    }

    fn finish(&self, tally: DrainTally) -> SyncStatusInfo {
        let pending = self.pending_count();
        let now = self.clock.now();
        tracing::info!(
            applied = tally.applied,
            conflicts = tally.conflicts,
            failed = tally.failed,
            aborted = tally.aborted,
            pending,
            "drain finished"
        );
        self.publish(|s| {
            s.pending_operations = pending;
            if tally.aborted {
                s.status = SyncStatus::Idle;
                s.error_message = None;
            } else if let Some(error) = tally.first_error {
                s.status = SyncStatus::Error;
                s.error_message = Some(if tally.failed > 1 {
                    format!("{} operations failed; first error: {error}", tally.failed)
                } else {
                    error
                });
            } else {
                s.status =
                    if tally.conflicts > 0 { SyncStatus::Conflict } else { SyncStatus::Synced };
                s.error_message = None;
                s.last_sync_time = Some(now);
            }
        })
    }

    /// Background worker loop. Returns when `shutdown` flips or closes.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut connectivity = self.connectivity.subscribe();
        let mut was_online = *connectivity.borrow_and_update();
        let mut backoff = Backoff::new(&self.config);
        let mut retry_at: Option<Instant> = None;

        if was_online {
            retry_at = self.drain_and_schedule(&mut backoff).await;
        }

        loop {
            let deadline = retry_at;
            let retry = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = shutdown.changed() => break,
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *connectivity.borrow_and_update();
                    if online && !was_online {
                        tracing::info!("back online; draining queue");
                        backoff.reset();
                        retry_at = self.drain_and_schedule(&mut backoff).await;
                    }
                    was_online = online;
                }
                _ = self.drain_requested.notified() => {
                    if self.connectivity.is_online() {
                        retry_at = self.drain_and_schedule(&mut backoff).await;
                    }
                }
                _ = retry => {
                    retry_at = None;
                    if self.connectivity.is_online() {
                        retry_at = self.drain_and_schedule(&mut backoff).await;
                    }
                }
            }
        }
        tracing::debug!("sync worker stopped");
    }

    /// Drains, then returns when to retry if the drain left failures behind.
    async fn drain_and_schedule(&self, backoff: &mut Backoff) -> Option<Instant> {
        let status = self.drain().await;
        if status.status == SyncStatus::Error {
            let delay = backoff.next_delay();
            tracing::warn!(retry_in_ms = delay.as_millis() as u64, "drain failed; retry scheduled");
            Some(Instant::now() + delay)
        } else {
            backoff.reset();
            None
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
