// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync status reported to the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Nothing in flight. Also reported when a drain stopped because the
    /// device went offline.
    #[default]
    Idle,
    Syncing,
    /// The last drain applied every operation it attempted.
    Synced,
    /// The last drain hit a transient failure; affected operations stay queued.
    Error,
    /// The last drain abandoned at least one operation to a newer remote copy.
    Conflict,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
            SyncStatus::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatusInfo {
    pub status: SyncStatus,
    /// When a drain last finished with no transient failure and no abort.
    pub last_sync_time: Option<DateTime<Utc>>,
    pub pending_operations: usize,
    /// Conflicts since start or the last reset.
    pub conflict_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
