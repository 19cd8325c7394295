// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage behind the cache and the operation queue.
//!
//! Business logic never branches on the backend: the cache manager and the
//! operation queue hold an `Arc<dyn CacheBackend>` / `Arc<dyn QueueBackend>`
//! chosen when the data layer is constructed.
//!
//! - [`Database`]: SQLite, survives restarts (WAL mode, single-row statements)
//! - [`MemoryStore`]: process-local, for tests and ephemeral sessions

use chrono::{DateTime, Utc};

use crate::entry::CacheEntry;
use crate::error::Result;
use crate::op::{ConflictRecord, OfflineOperation, OpId};
use crate::priority::Priority;

mod memory;
mod sqlite;


pub use memory::MemoryStore;
pub use sqlite::{run_migrations, Database, SCHEMA};

/// Key/value persistence for cache entries.
///
/// Every method is atomic with respect to concurrent callers: a reader never
/// observes a half-written entry.
pub trait CacheBackend: Send + Sync {
    /// Inserts or replaces an entry, returning the priority of the entry it replaced.
    fn put_entry(&self, entry: &CacheEntry) -> Result<Option<Priority>>;

    /// Reads an entry regardless of expiry.
    fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Deletes an entry, returning its priority if it existed.
    fn remove_entry(&self, key: &str) -> Result<Option<Priority>>;

    /// Deletes an entry only if it is still expired at `now`.
    ///
    /// Lazy removal goes through here so it cannot delete a value that was
    /// re-stored after the expired read.
    fn remove_entry_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Priority>>;

    /// Deletes every entry expired at `now` and returns what was deleted.
    fn remove_expired(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>>;

    /// Full-table scan.
    fn scan_entries(&self) -> Result<Vec<CacheEntry>>;

    /// Deletes every entry, returning how many were removed.
    fn clear_entries(&self) -> Result<usize>;
}

/// Durable storage for queued operations and the conflict log.
pub trait QueueBackend: Send + Sync {
    /// Inserts an operation, replacing any operation with the same id.
    fn insert_operation(&self, op: &OfflineOperation) -> Result<()>;

    /// Removes an operation, returning whether it was present.
    fn remove_operation(&self, id: &OpId) -> Result<bool>;

    /// Records a conflict and removes its operation in one step.
    fn abandon_operation(&self, record: &ConflictRecord) -> Result<bool>;

    /// Full-table scan in no particular order.
    fn scan_operations(&self) -> Result<Vec<OfflineOperation>>;

    fn count_operations(&self) -> Result<usize>;

    /// Conflict log, oldest first.
    fn scan_conflicts(&self) -> Result<Vec<ConflictRecord>>;

    fn clear_conflicts(&self) -> Result<usize>;
}
