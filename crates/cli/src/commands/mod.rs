// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod config;
pub mod queue;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use harbor_core::{CacheManager, ClockSource, Database, HlcClock, OperationQueue, SystemClock};
use harbor_engine::Config;

use crate::error::Result;

/// The store opened for one command invocation.
pub struct Store {
    pub cache: CacheManager,
    pub queue: OperationQueue,
    pub ids: HlcClock,
}

impl Store {
    /// Opens the SQLite store at `path` with the configured TTLs.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let db = Arc::new(Database::open(path)?);
        Self::with_backend(db, config, Arc::new(SystemClock))
    }

    pub(crate) fn with_backend(
        db: Arc<Database>,
        config: &Config,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let cache = CacheManager::new(db.clone(), config.cache.ttl.clone(), clock.clone())?;
        let queue = OperationQueue::new(db);

        // Each invocation starts a fresh clock, so ids must land after
        // anything an earlier invocation queued.
        let ids = HlcClock::with_clock(clock, config.sync.node_id);
        if let Some(last) = queue.pending()?.iter().map(|op| op.id).max() {
            ids.observe(&last);
        }
        Ok(Store { cache, queue, ids })
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
