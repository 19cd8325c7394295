// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The application-facing data layer.
//!
//! [`DataLayer`] owns one of everything: the cache, the operation queue,
//! the sync engine, connectivity tracking, both pool managers, and the
//! performance monitor. It is built once per process and shared by
//! reference; there are no global singletons.

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use harbor_core::{
    CacheBackend, CacheManager, CacheStats, ClockSource, ConflictRecord, HlcClock, MemoryStore,
    OfflineOperation, OpId, OpKind, OperationQueue, Priority, QueueBackend, SystemClock,
};

use crate::config::Config;
use crate::connections::ConnectionPoolManager;
use crate::connectivity::{ConnectivityChanges, ConnectivityMonitor, ReachabilityProbe};
use crate::error::{Error, Result};
use crate::listeners::{ListenerPoolManager, ListenerSubscription};
use crate::monitor::{
    Alert, AlertConfig, AlertKind, OptimizationSuggestion, PerformanceMonitor, PerformanceSummary,
};
use crate::pool::PoolStatistics;
use crate::remote::{Filter, QueryPage, QueryRequest, RemoteStore, RemoteUpdate};
use crate::status::SyncStatusInfo;
use crate::subscription::Subscription;
use crate::sync::SyncEngine;

/// Cache key for one document.
pub fn document_cache_key(resource_path: &str, document_id: &str) -> String {
    format!("{resource_path}/{document_id}")
}

fn query_cache_key(resource_path: &str, request: &QueryRequest) -> Result<String> {
    let request = serde_json::to_string(request).map_err(harbor_core::Error::from)?;
    Ok(format!("query:{resource_path}:{request}"))
}

/// Shallow-merges an update into the cached document.
fn merge(existing: Option<Value>, patch: Value) -> Value {
    match (existing, patch) {
        (Some(Value::Object(mut base)), Value::Object(patch)) => {
            base.extend(patch);
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

/// Mirrors a queued operation into the cache before the remote confirms it.
///
/// Creates store the payload, updates merge into the cached copy, and
/// deletes evict it.
pub fn apply_optimistic(cache: &CacheManager, op: &OfflineOperation) -> harbor_core::Result<()> {
    let key = document_cache_key(&op.resource_path, &op.document_id);
    match op.kind {
        OpKind::Delete => {
            cache.remove(&key)?;
        }
        OpKind::Create => cache.store(&key, op.payload.clone(), op.priority, None)?,
        OpKind::Update => {
            let merged = merge(cache.retrieve(&key)?, op.payload.clone());
            cache.store(&key, merged, op.priority, None)?;
        }
    }
    Ok(())
}

#[derive(Default)]
pub struct DataLayerBuilder {
    config: Config,
    cache_backend: Option<Arc<dyn CacheBackend>>,
    queue_backend: Option<Arc<dyn QueueBackend>>,
    remote: Option<Arc<dyn RemoteStore>>,
    clock: Option<Arc<dyn ClockSource>>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
}

impl DataLayerBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Uses one store for both the cache and the operation queue.
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: CacheBackend + QueueBackend + 'static,
    {
        self.cache_backend = Some(store.clone());
        self.queue_backend = Some(store);
        self
    }

    pub fn cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    pub fn queue_backend(mut self, backend: Arc<dyn QueueBackend>) -> Self {
        self.queue_backend = Some(backend);
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Validates the configuration and wires the components together.
    ///
    /// Without an explicit store, everything lives in memory.
    pub fn build(self) -> Result<DataLayer> {
        let config = self.config;
        config.validate()?;
        let remote = self.remote.ok_or_else(|| Error::Config("no remote store set".into()))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let memory = Arc::new(MemoryStore::default());
        let cache_backend: Arc<dyn CacheBackend> = match self.cache_backend {
            Some(backend) => backend,
            None => memory.clone(),
        };
        let queue_backend: Arc<dyn QueueBackend> = match self.queue_backend {
            Some(backend) => backend,
            None => memory,
        };

        let cache =
            Arc::new(CacheManager::new(cache_backend, config.cache.ttl.clone(), clock.clone())?);
        let queue = Arc::new(OperationQueue::new(queue_backend));
        let monitor = Arc::new(PerformanceMonitor::new(&config.performance, clock.clone()));
        let connections =
            Arc::new(ConnectionPoolManager::new(&config.pools, Arc::clone(&monitor)));
        let listeners = Arc::new(ListenerPoolManager::new(&config.pools, Arc::clone(&monitor)));
        let connectivity = ConnectivityMonitor::new(
            config.connectivity.start_online,
            config.connectivity.debounce(),
        );
        let sync = Arc::new(SyncEngine::new(
            Arc::clone(&queue),
            Arc::clone(&remote),
            Arc::clone(&connections),
            connectivity.clone(),
            clock.clone(),
            config.sync.clone(),
        )?);
        // A persistent queue may hold ids from a run whose clock was ahead.
        let ids = HlcClock::with_clock(clock, config.sync.node_id);
        if let Some(last) = queue.pending()?.iter().map(|op| op.id).max() {
            ids.observe(&last);
        }
        let (shutdown, _) = watch::channel(false);

        Ok(DataLayer {
            config,
            cache,
            queue,
            sync,
            connectivity,
            connections,
            listeners,
            monitor,
            remote,
            probe: self.probe,
            ids,
            shutdown,
            tasks: Mutex::new(Vec::new()),
        })
    }
}

pub struct DataLayer {
    config: Config,
    cache: Arc<CacheManager>,
    queue: Arc<OperationQueue>,
    sync: Arc<SyncEngine>,
    connectivity: ConnectivityMonitor,
    connections: Arc<ConnectionPoolManager>,
    listeners: Arc<ListenerPoolManager>,
    monitor: Arc<PerformanceMonitor>,
    remote: Arc<dyn RemoteStore>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
    ids: HlcClock,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DataLayer {
    pub fn builder() -> DataLayerBuilder {
        DataLayerBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn connections(&self) -> &ConnectionPoolManager {
        &self.connections
    }

    pub fn listeners(&self) -> &ListenerPoolManager {
        &self.listeners
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawns the background tasks: connectivity debouncing, the optional
    /// reachability probe, the sync worker, the cache sweeper, and the
    /// summary publisher. Must be called inside a Tokio runtime. Calling it
    /// again while running does nothing.
    pub fn start(&self) {
        let mut tasks = self.tasks();
        if !tasks.is_empty() {
            return;
        }
        self.shutdown.send_replace(false);

        tasks.push(self.connectivity.spawn(self.shutdown.subscribe()));
        if let Some(probe) = &self.probe {
            tasks.push(self.connectivity.spawn_probe(
                Arc::clone(probe),
                self.config.connectivity.probe_interval(),
                self.shutdown.subscribe(),
            ));
        }
        tasks.push(tokio::spawn(Arc::clone(&self.sync).run(self.shutdown.subscribe())));

        let cache = Arc::clone(&self.cache);
        let connections = Arc::clone(&self.connections);
        let listeners = Arc::clone(&self.listeners);
        tasks.push(spawn_periodic(
            self.config.cache.sweep_interval(),
            self.shutdown.subscribe(),
            move || {
                if let Err(e) = cache.clear_expired() {
                    tracing::error!(error = %e, "cache sweep failed");
                }
                connections.pools().prune_idle();
                listeners.prune_idle();
            },
        ));

        let monitor = Arc::clone(&self.monitor);
        tasks.push(spawn_periodic(
            self.config.performance.summary_interval(),
            self.shutdown.subscribe(),
            move || {
                monitor.publish_summary();
            },
        ));
        tracing::info!(tasks = tasks.len(), "data layer started");
    }

    /// Stops the background tasks and waits for them to exit. Queued
    /// operations stay queued.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let tasks: Vec<_> = self.tasks().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "background task failed");
            }
        }
        tracing::info!("data layer stopped");
    }

    /// Records a local mutation.
    ///
    /// The operation is validated and queued durably, then applied to the
    /// cache so reads see it at once, and the sync worker is woken.
    pub fn write(
        &self,
        resource_path: &str,
        document_id: &str,
        kind: OpKind,
        payload: Value,
        priority: Priority,
    ) -> Result<OpId> {
        let id = self.ids.now();
        let op = OfflineOperation::new(id, resource_path, document_id, kind, payload, priority);
        self.sync.enqueue(&op)?;
        apply_optimistic(&self.cache, &op)?;
        Ok(op.id)
    }

    /// The cached copy of a document, if live.
    pub fn read(&self, resource_path: &str, document_id: &str) -> Result<Option<Value>> {
        Ok(self.cache.retrieve(&document_cache_key(resource_path, document_id))?)
    }

    /// Fetches a page from the remote store through the connection pool.
    ///
    /// Successful pages are cached. When offline, or when the remote call
    /// fails, the last cached copy of the same page is returned instead.
    pub async fn query(&self, resource_path: &str, request: QueryRequest) -> Result<QueryPage> {
        let key = query_cache_key(resource_path, &request)?;
        if self.connectivity.is_online() {
            match self.connections.query(self.remote.as_ref(), resource_path, request).await {
                Ok(page) => {
                    if let Err(e) = self.cache.store_json(&key, &page, Priority::Medium, None) {
                        tracing::warn!(
                            resource = resource_path,
                            error = %e,
                            "failed to cache page"
                        );
                    }
                    return Ok(page);
                }
                Err(e) => match self.cache.retrieve_json::<QueryPage>(&key)? {
                    Some(page) => {
                        tracing::warn!(
                            resource = resource_path,
                            error = %e,
                            "query failed; serving cached page"
                        );
                        return Ok(page);
                    }
                    None => return Err(e),
                },
            }
        }
        self.cache
            .retrieve_json::<QueryPage>(&key)?
            .ok_or_else(|| Error::Offline(resource_path.to_string()))
    }

    /// Opens a subscription through the listener pool.
    pub async fn subscribe(
        &self,
        resource_path: &str,
        filters: Vec<Filter>,
    ) -> Result<ListenerSubscription> {
        self.listeners.subscribe(self.remote.as_ref(), resource_path, filters).await
    }

    /// Writes a pushed update into the cache.
    ///
    /// Documents with queued local mutations keep their local copy until
    /// those mutations are acknowledged. Returns whether the cache changed.
    pub fn apply_remote_update(
        &self,
        resource_path: &str,
        update: &RemoteUpdate,
        priority: Priority,
    ) -> Result<bool> {
        let document_id = match update {
            RemoteUpdate::Upserted { document_id, .. }
            | RemoteUpdate::Removed { document_id, .. } => document_id,
        };
        let has_local = self
            .queue
            .pending()?
            .iter()
            .any(|op| op.resource_path == resource_path && op.document_id == *document_id);
        if has_local {
            tracing::debug!(
                resource = resource_path,
                document = %document_id,
                "remote update deferred to local write"
            );
            return Ok(false);
        }

        let key = document_cache_key(resource_path, document_id);
        match update {
            RemoteUpdate::Upserted { payload, .. } => {
                self.cache.store(&key, payload.clone(), priority, None)?;
                Ok(true)
            }
            RemoteUpdate::Removed { .. } => Ok(self.cache.remove(&key)?),
        }
    }

    /// Feeds a raw connectivity signal into the debouncer.
    pub fn report_connectivity(&self, online: bool) {
        self.connectivity.report(online);
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub async fn drain(&self) -> SyncStatusInfo {
        self.sync.drain().await
    }

    pub fn sync_status(&self) -> SyncStatusInfo {
        self.sync.current_status()
    }

    pub fn status_stream(&self) -> Subscription<SyncStatusInfo> {
        self.sync.status_stream()
    }

    pub fn connectivity_changes(&self) -> ConnectivityChanges {
        self.connectivity.changes()
    }

    pub fn performance_summaries(&self) -> Subscription<PerformanceSummary> {
        self.monitor.summaries()
    }

    pub fn alerts(&self) -> Subscription<Alert> {
        self.monitor.alerts()
    }

    pub fn pending_operations(&self) -> Result<Vec<OfflineOperation>> {
        Ok(self.queue.pending()?)
    }

    pub fn conflicts(&self) -> Result<Vec<ConflictRecord>> {
        self.sync.conflicts()
    }

    pub fn clear_conflicts(&self) -> Result<usize> {
        self.sync.clear_conflicts()
    }

    pub fn cache_stats(&self) -> Result<CacheStats> {
        Ok(self.cache.stats()?)
    }

    /// Connection pools first, then listener pools.
    pub fn pool_statistics(&self) -> Vec<PoolStatistics> {
        let mut stats = self.connections.statistics();
        stats.extend(self.listeners.statistics());
        stats
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        self.monitor.summary()
    }

    pub fn optimization_suggestions(&self) -> Vec<OptimizationSuggestion> {
        self.monitor.optimization_suggestions()
    }

    pub fn configure_alert(&self, kind: AlertKind, config: AlertConfig) {
        self.monitor.configure_alert(kind, config);
    }
}

fn spawn_periodic<F>(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => tick(),
            }
        }
    })
}

#[cfg(test)]
#[path = "layer_tests.rs"]
mod tests;
