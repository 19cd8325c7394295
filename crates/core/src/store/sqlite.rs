// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed store for cache entries, queued operations and conflicts.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{CacheBackend, QueueBackend};
use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::hlc::millis_to_datetime;
use crate::op::{ConflictRecord, OfflineOperation, OpId};
use crate::priority::Priority;

/// SQL schema for the offline store.
///
/// Timestamps are integer milliseconds since the Unix epoch so expiry sweeps
/// are plain range deletes.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    priority TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    CHECK (expires_at > created_at)
);

CREATE TABLE IF NOT EXISTS operations (
    id TEXT PRIMARY KEY,
    resource_path TEXT NOT NULL,
    document_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    enqueued_at INTEGER NOT NULL,
    priority TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS conflicts (
    id TEXT PRIMARY KEY,
    operation TEXT NOT NULL,
    server_timestamp INTEGER NOT NULL,
    detected_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);
CREATE INDEX IF NOT EXISTS idx_operations_document ON operations(resource_path, document_id);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| corrupted(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse a JSON column.
fn parse_json<T: serde::de::DeserializeOwned>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    serde_json::from_str(value)
        .map_err(|e| corrupted(format!("invalid JSON in column '{column}': {e}")))
}

/// Parse a millisecond timestamp column.
fn parse_millis(value: i64, column: &str) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    u64::try_from(value)
        .map(millis_to_datetime)
        .map_err(|_| corrupted(format!("negative timestamp {value} in column '{column}'")))
}

fn corrupted(msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(msg)),
    )
}

fn row_to_entry(row: &Row<'_>) -> std::result::Result<CacheEntry, rusqlite::Error> {
    let payload: String = row.get("payload")?;
    let priority: String = row.get("priority")?;
    Ok(CacheEntry {
        key: row.get("key")?,
        payload: parse_json(&payload, "payload")?,
        priority: parse_db(&priority, "priority")?,
        created_at: parse_millis(row.get("created_at")?, "created_at")?,
        expires_at: parse_millis(row.get("expires_at")?, "expires_at")?,
    })
}

fn row_to_operation(row: &Row<'_>) -> std::result::Result<OfflineOperation, rusqlite::Error> {
    let id: String = row.get("id")?;
    let kind: String = row.get("kind")?;
    let payload: String = row.get("payload")?;
    let priority: String = row.get("priority")?;
    Ok(OfflineOperation {
        id: parse_db(&id, "id")?,
        resource_path: row.get("resource_path")?,
        document_id: row.get("document_id")?,
        kind: parse_db(&kind, "kind")?,
        payload: parse_json(&payload, "payload")?,
        enqueued_at: parse_millis(row.get("enqueued_at")?, "enqueued_at")?,
        priority: parse_db(&priority, "priority")?,
    })
}

fn row_to_conflict(row: &Row<'_>) -> std::result::Result<ConflictRecord, rusqlite::Error> {
    let operation: String = row.get("operation")?;
    Ok(ConflictRecord {
        operation: parse_json(&operation, "operation")?,
        server_timestamp: parse_millis(row.get("server_timestamp")?, "server_timestamp")?,
        detected_at: parse_millis(row.get("detected_at")?, "detected_at")?,
    })
}

/// Run schema creation on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// SQLite store implementing both [`CacheBackend`] and [`QueueBackend`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL keeps readers off half-committed writes and survives crashes.
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        run_migrations(&conn)?;
        tracing::debug!(path = %path.display(), "opened offline store");
        Ok(Database { conn: Mutex::new(conn) })
    }

    /// Opens a private in-memory database (used by tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Database { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }
}

impl CacheBackend for Database {
    fn put_entry(&self, entry: &CacheEntry) -> Result<Option<Priority>> {
        let payload = serde_json::to_string(&entry.payload)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let previous: Option<String> = tx
            .query_row(
                "SELECT priority FROM cache_entries WHERE key = ?1",
                params![entry.key],
                |row| row.get(0),
            )
            .optional()?;
        tx.execute(
            "INSERT OR REPLACE INTO cache_entries (key, payload, priority, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.key,
                payload,
                entry.priority.as_str(),
                entry.created_at.timestamp_millis(),
                entry.expires_at.timestamp_millis(),
            ],
        )?;
        tx.commit()?;
        previous.map(|p| p.parse()).transpose()
    }

    fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;
        let entry = conn
            .query_row(
                "SELECT key, payload, priority, created_at, expires_at
                 FROM cache_entries WHERE key = ?1",
                params![key],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn remove_entry(&self, key: &str) -> Result<Option<Priority>> {
        let conn = self.lock()?;
        let priority: Option<String> = conn
            .query_row(
                "DELETE FROM cache_entries WHERE key = ?1 RETURNING priority",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        priority.map(|p| p.parse()).transpose()
    }

    fn remove_entry_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Priority>> {
        let conn = self.lock()?;
        let priority: Option<String> = conn
            .query_row(
                "DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2 RETURNING priority",
                params![key, now.timestamp_millis()],
                |row| row.get(0),
            )
            .optional()?;
        priority.map(|p| p.parse()).transpose()
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = {
            let mut stmt = tx.prepare(
                "DELETE FROM cache_entries WHERE expires_at <= ?1
                 RETURNING key, payload, priority, created_at, expires_at",
            )?;
            let rows = stmt.query_map(params![now.timestamp_millis()], row_to_entry)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        tx.commit()?;
        Ok(removed)
    }

    fn scan_entries(&self) -> Result<Vec<CacheEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, payload, priority, created_at, expires_at
             FROM cache_entries ORDER BY key",
        )?;
        let entries = stmt
            .query_map([], row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn clear_entries(&self) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM cache_entries", [])?)
    }
}

impl QueueBackend for Database {
    fn insert_operation(&self, op: &OfflineOperation) -> Result<()> {
        let payload = serde_json::to_string(&op.payload)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO operations
             (id, resource_path, document_id, kind, payload, enqueued_at, priority)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                op.id.to_string(),
                op.resource_path,
                op.document_id,
                op.kind.as_str(),
                payload,
                op.enqueued_at.timestamp_millis(),
                op.priority.as_str(),
            ],
        )?;
        Ok(())
    }

    fn remove_operation(&self, id: &OpId) -> Result<bool> {
        let conn = self.lock()?;
        let removed =
            conn.execute("DELETE FROM operations WHERE id = ?1", params![id.to_string()])?;
        Ok(removed > 0)
    }

    fn abandon_operation(&self, record: &ConflictRecord) -> Result<bool> {
        let operation = serde_json::to_string(&record.operation)?;
        let id = record.operation.id.to_string();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO conflicts (id, operation, server_timestamp, detected_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                operation,
                record.server_timestamp.timestamp_millis(),
                record.detected_at.timestamp_millis(),
            ],
        )?;
        let removed = tx.execute("DELETE FROM operations WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn scan_operations(&self) -> Result<Vec<OfflineOperation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, resource_path, document_id, kind, payload, enqueued_at, priority
             FROM operations",
        )?;
        let ops = stmt
            .query_map([], row_to_operation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ops)
    }

    fn count_operations(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM operations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn scan_conflicts(&self) -> Result<Vec<ConflictRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT operation, server_timestamp, detected_at
             FROM conflicts ORDER BY detected_at, id",
        )?;
        let records = stmt
            .query_map([], row_to_conflict)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn clear_conflicts(&self) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM conflicts", [])?)
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
