// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cache entries as persisted by the cache store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::priority::Priority;

/// A single cached value with its retention window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` after `created_at`.
    ///
    /// A zero TTL would violate `expires_at > created_at` and is rejected.
    pub fn new(
        key: impl Into<String>,
        payload: Value,
        priority: Priority,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::Validation("cache key is empty".into()));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| Error::Validation(format!("ttl {ttl:?} is out of range")))?;
        if ttl <= chrono::Duration::zero() {
            return Err(Error::Validation("ttl must be greater than zero".into()));
        }
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Validation("ttl overflows the timestamp range".into()))?;

        Ok(CacheEntry { key, payload, priority, created_at, expires_at })
    }

    /// Returns true once the entry is logically absent.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, zero if already expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}
