// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pools for one-shot remote calls.

use std::future::Future;
use std::sync::Arc;

use crate::config::PoolConfig;
use crate::error::Result;
use crate::monitor::PerformanceMonitor;
use crate::pool::{PoolHandle, PoolKind, PoolManager, PoolStatistics};
use crate::remote::{QueryPage, QueryRequest, RemoteResult, RemoteStore};

/// Bounds concurrent queries and writes per resource path.
pub struct ConnectionPoolManager {
    pools: PoolManager,
}

impl ConnectionPoolManager {
    pub fn new(config: &PoolConfig, monitor: Arc<PerformanceMonitor>) -> Self {
        ConnectionPoolManager {
            pools: PoolManager::new(
                PoolKind::Connection,
                config.max_connections,
                config.connection_overrides.clone(),
                config.acquire_timeout(),
                monitor,
            ),
        }
    }

    pub fn pools(&self) -> &PoolManager {
        &self.pools
    }

    pub async fn acquire(&self, resource_path: &str) -> Result<PoolHandle> {
        self.pools.acquire(resource_path).await
    }

    /// Runs `work` while holding a slot for `resource_path`.
    ///
    /// `work` is not polled until the slot is held. A remote error, or
    /// dropping this future before `work` resolves, marks the execution
    /// failed in the performance metrics.
    pub async fn execute<T, F>(&self, resource_path: &str, work: F) -> Result<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        let mut handle = self.acquire(resource_path).await?;
        handle.mark_failed();
        let value = work.await?;
        handle.mark_succeeded();
        Ok(value)
    }

    /// Fetches one page through the pool, recording the page size.
    pub async fn query(
        &self,
        remote: &dyn RemoteStore,
        resource_path: &str,
        request: QueryRequest,
    ) -> Result<QueryPage> {
        let mut handle = self.acquire(resource_path).await?;
        handle.mark_failed();
        let page = remote.query(resource_path, request).await?;
        handle.mark_succeeded();
        handle.set_result_count(page.items.len());
        Ok(page)
    }

    pub fn statistics(&self) -> Vec<PoolStatistics> {
        self.pools.statistics()
    }
}

#[cfg(test)]
#[path = "connections_tests.rs"]
mod tests;
