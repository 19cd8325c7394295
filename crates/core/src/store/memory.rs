// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store. Same contract as [`super::Database`], nothing persisted.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{CacheBackend, QueueBackend};
use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::op::{ConflictRecord, OfflineOperation, OpId};
use crate::priority::Priority;

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    operations: RwLock<BTreeMap<OpId, OfflineOperation>>,
    conflicts: RwLock<Vec<ConflictRecord>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| Error::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| Error::LockPoisoned)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryStore {
    fn put_entry(&self, entry: &CacheEntry) -> Result<Option<Priority>> {
        let previous = write(&self.entries)?.insert(entry.key.clone(), entry.clone());
        Ok(previous.map(|e| e.priority))
    }

    fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(read(&self.entries)?.get(key).cloned())
    }

    fn remove_entry(&self, key: &str) -> Result<Option<Priority>> {
        Ok(write(&self.entries)?.remove(key).map(|e| e.priority))
    }

    fn remove_entry_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Priority>> {
        let mut entries = write(&self.entries)?;
        match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                Ok(entries.remove(key).map(|e| e.priority))
            }
            _ => Ok(None),
        }
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
        let mut entries = write(&self.entries)?;
        let expired: Vec<String> = entries
            .values()
            .filter(|e| e.is_expired_at(now))
            .map(|e| e.key.clone())
            .collect();
        Ok(expired.iter().filter_map(|key| entries.remove(key)).collect())
    }

    fn scan_entries(&self) -> Result<Vec<CacheEntry>> {
        let mut entries: Vec<CacheEntry> = read(&self.entries)?.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn clear_entries(&self) -> Result<usize> {
        let mut entries = write(&self.entries)?;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}

impl QueueBackend for MemoryStore {
    fn insert_operation(&self, op: &OfflineOperation) -> Result<()> {
        write(&self.operations)?.insert(op.id, op.clone());
        Ok(())
    }

    fn remove_operation(&self, id: &OpId) -> Result<bool> {
        Ok(write(&self.operations)?.remove(id).is_some())
    }

    fn abandon_operation(&self, record: &ConflictRecord) -> Result<bool> {
        // Lock order: operations, then conflicts.
        let mut operations = write(&self.operations)?;
        let mut conflicts = write(&self.conflicts)?;
        conflicts.retain(|c| c.operation.id != record.operation.id);
        conflicts.push(record.clone());
        Ok(operations.remove(&record.operation.id).is_some())
    }

    fn scan_operations(&self) -> Result<Vec<OfflineOperation>> {
        Ok(read(&self.operations)?.values().cloned().collect())
    }

    fn count_operations(&self) -> Result<usize> {
        Ok(read(&self.operations)?.len())
    }

    fn scan_conflicts(&self) -> Result<Vec<ConflictRecord>> {
        Ok(read(&self.conflicts)?.clone())
    }

    fn clear_conflicts(&self) -> Result<usize> {
        let mut conflicts = write(&self.conflicts)?;
        let count = conflicts.len();
        conflicts.clear();
        Ok(count)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
