// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Priority-tiered, TTL-aware cache over a [`CacheBackend`].
//!
//! Expired entries are logically absent: [`CacheManager::retrieve`] never
//! returns them and removes them lazily, and [`CacheManager::clear_expired`]
//! sweeps the rest. Per-priority counters are rebuilt from the backend on
//! construction and kept in step with every store and remove.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::hlc::ClockSource;
use crate::priority::Priority;
use crate::store::CacheBackend;

const HOUR_SECS: u64 = 60 * 60;

/// Default retention per priority tier, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    pub critical_secs: u64,
    pub high_secs: u64,
    pub medium_secs: u64,
    pub low_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy {
            critical_secs: 7 * 24 * HOUR_SECS,
            high_secs: 24 * HOUR_SECS,
            medium_secs: 6 * HOUR_SECS,
            low_secs: HOUR_SECS,
        }
    }
}

impl TtlPolicy {
    pub fn default_ttl(&self, priority: Priority) -> Duration {
        let secs = match priority {
            Priority::Critical => self.critical_secs,
            Priority::High => self.high_secs,
            Priority::Medium => self.medium_secs,
            Priority::Low => self.low_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Snapshot returned by [`CacheManager::stats`].
///
/// Counts include entries that have expired but not yet been swept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub entries_by_priority: BTreeMap<Priority, usize>,
}

#[derive(Debug, Default)]
struct PriorityCounts([usize; 4]);

impl PriorityCounts {
    fn add(&mut self, priority: Priority) {
        self.0[priority.rank() as usize] += 1;
    }

    fn sub(&mut self, priority: Priority) {
        let slot = &mut self.0[priority.rank() as usize];
        *slot = slot.saturating_sub(1);
    }

    fn clear(&mut self) {
        self.0 = [0; 4];
    }
}

pub struct CacheManager {
    backend: Arc<dyn CacheBackend>,
    policy: TtlPolicy,
    clock: Arc<dyn ClockSource>,
    // Held across backend mutations so counters never drift from the table.
    counts: Mutex<PriorityCounts>,
}

impl CacheManager {
    /// Creates a manager and rebuilds its counters from the backend.
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        policy: TtlPolicy,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let mut counts = PriorityCounts::default();
        for entry in backend.scan_entries()? {
            counts.add(entry.priority);
        }
        Ok(CacheManager { backend, policy, clock, counts: Mutex::new(counts) })
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    fn counts(&self) -> Result<MutexGuard<'_, PriorityCounts>> {
        self.counts.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Stores a value. An explicit `ttl` overrides the priority default.
    pub fn store(
        &self,
        key: &str,
        payload: Value,
        priority: Priority,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let ttl = ttl.unwrap_or_else(|| self.policy.default_ttl(priority));
        let entry = CacheEntry::new(key, payload, priority, self.clock.now(), ttl)?;

        let mut counts = self.counts()?;
        if let Some(previous) = self.backend.put_entry(&entry)? {
            counts.sub(previous);
        }
        counts.add(priority);
        tracing::debug!(key, %priority, ttl_secs = ttl.as_secs(), "cache store");
        Ok(())
    }

    /// Serializes and stores a value.
    pub fn store_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        priority: Priority,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.store(key, serde_json::to_value(value)?, priority, ttl)
    }

    /// Returns the full entry for `key` unless it is absent or expired.
    pub fn retrieve_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let Some(entry) = self.backend.get_entry(key)? else {
            return Ok(None);
        };

        let now = self.clock.now();
        if !entry.is_expired_at(now) {
            return Ok(Some(entry));
        }

        let mut counts = self.counts()?;
        if let Some(priority) = self.backend.remove_entry_if_expired(key, now)? {
            counts.sub(priority);
            tracing::debug!(key, "expired entry removed on read");
        }
        Ok(None)
    }

    pub fn retrieve(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.retrieve_entry(key)?.map(|entry| entry.payload))
    }

    /// Retrieves and deserializes a value.
    pub fn retrieve_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.retrieve(key)?.map(serde_json::from_value).transpose().map_err(Error::from)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.retrieve_entry(key)?.is_some())
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut counts = self.counts()?;
        match self.backend.remove_entry(key)? {
            Some(priority) => {
                counts.sub(priority);
                tracing::debug!(key, "cache remove");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every entry, returning how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut counts = self.counts()?;
        let removed = self.backend.clear_entries()?;
        counts.clear();
        tracing::info!(removed, "cache cleared");
        Ok(removed)
    }

    /// Sweeps expired entries. Idempotent; safe alongside concurrent stores.
    pub fn clear_expired(&self) -> Result<usize> {
        let mut counts = self.counts()?;
        let removed = self.backend.remove_expired(self.clock.now())?;
        for entry in &removed {
            counts.sub(entry.priority);
        }
        if !removed.is_empty() {
            tracing::debug!(removed = removed.len(), "swept expired cache entries");
        }
        Ok(removed.len())
    }

    /// Lists entries that are still live, ordered by key.
    pub fn live_entries(&self) -> Result<Vec<CacheEntry>> {
        let now = self.clock.now();
        Ok(self.backend.scan_entries()?.into_iter().filter(|e| !e.is_expired_at(now)).collect())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let counts = self.counts()?;
        let entries_by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, counts.0[p.rank() as usize])).collect();
        Ok(CacheStats { total_entries: counts.0.iter().sum(), entries_by_priority })
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
