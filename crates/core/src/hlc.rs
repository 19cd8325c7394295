// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid Logical Clock (HLC) timestamps and injectable clock sources.
//!
//! Queued operations are identified by an HLC so that ids are unique and
//! strictly increasing within a process, even when several writes land in
//! the same millisecond or the wall clock steps backwards.
//!
//! Format: `{wall_ms}-{counter}-{node_id}`
//!
//! Ordering rules:
//! 1. Higher wall_ms wins
//! 2. If wall_ms equal, higher counter wins
//! 3. If both equal, higher node_id wins (deterministic tiebreaker)

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// A Hybrid Logical Clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hlc {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Logical counter for ordering events at the same wall time.
    pub counter: u32,
    /// Node identifier for deterministic tiebreaking.
    pub node_id: u32,
}

impl Hlc {
    /// Creates a new HLC with the given components.
    pub fn new(wall_ms: u64, counter: u32, node_id: u32) -> Self {
        Hlc { wall_ms, counter, node_id }
    }

    /// Creates an HLC representing the earliest possible time.
    pub fn min() -> Self {
        Hlc { wall_ms: 0, counter: 0, node_id: 0 }
    }

    /// Parses an HLC from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Returns the wall clock component as a UTC timestamp.
    pub fn wall_time(&self) -> DateTime<Utc> {
        millis_to_datetime(self.wall_ms)
    }
}

impl Ord for Hlc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms
            .cmp(&other.wall_ms)
            .then_with(|| self.counter.cmp(&other.counter))
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for Hlc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Hlc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.wall_ms, self.counter, self.node_id)
    }
}

impl FromStr for Hlc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidHlc(format!(
                "expected format 'wall_ms-counter-node_id', got '{s}'"
            )));
        }

        let wall_ms = parts[0]
            .parse::<u64>()
            .map_err(|_| Error::InvalidHlc(format!("invalid wall_ms '{}' in '{s}'", parts[0])))?;

        let counter = parts[1]
            .parse::<u32>()
            .map_err(|_| Error::InvalidHlc(format!("invalid counter '{}' in '{s}'", parts[1])))?;

        let node_id = parts[2]
            .parse::<u32>()
            .map_err(|_| Error::InvalidHlc(format!("invalid node_id '{}' in '{s}'", parts[2])))?;

        Ok(Hlc::new(wall_ms, counter, node_id))
    }
}

/// Converts milliseconds since the Unix epoch to a UTC timestamp.
///
/// Out-of-range values saturate to the epoch.
pub fn millis_to_datetime(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_default()
}

/// Trait for getting the current wall clock time.
///
/// Every time-dependent component (TTL expiry, alert cooldowns, conflict
/// timestamps) reads time through this trait so tests can drive it.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Returns the current time as a UTC timestamp.
    fn now(&self) -> DateTime<Utc> {
        millis_to_datetime(self.now_ms())
    }
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// A clock that only moves when told to.
///
/// Used by tests across the workspace to step through TTLs and cooldowns.
#[derive(Debug, Default)]
pub struct ManualClock {
    time_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(initial_ms: u64) -> Self {
        ManualClock { time_ms: AtomicU64::new(initial_ms) }
    }

    pub fn set(&self, ms: u64) {
        self.time_ms.store(ms, AtomicOrdering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.time_ms.fetch_add(by.as_millis() as u64, AtomicOrdering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.time_ms.load(AtomicOrdering::SeqCst)
    }
}

/// A clock generator that produces monotonically increasing HLC timestamps.
pub struct HlcClock {
    clock: Arc<dyn ClockSource>,
    node_id: u32,
    last_wall_ms: Mutex<u64>,
    last_counter: AtomicU32,
}

impl HlcClock {
    /// Creates a new HLC clock with the system clock and given node ID.
    pub fn new(node_id: u32) -> Self {
        Self::with_clock(Arc::new(SystemClock), node_id)
    }

    /// Creates a new HLC clock with a custom clock source.
    pub fn with_clock(clock: Arc<dyn ClockSource>, node_id: u32) -> Self {
        HlcClock { clock, node_id, last_wall_ms: Mutex::new(0), last_counter: AtomicU32::new(0) }
    }

    /// Returns the node ID for this clock.
    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    /// Generates a new HLC timestamp.
    ///
    /// Guarantees monotonically increasing timestamps even if the wall clock
    /// goes backwards.
    pub fn now(&self) -> Hlc {
        let physical = self.clock.now_ms();
        let mut last_ms = self.last_wall_ms.lock().unwrap_or_else(|e| e.into_inner());

        let (wall_ms, counter) = if physical > *last_ms {
            *last_ms = physical;
            self.last_counter.store(0, AtomicOrdering::SeqCst);
            (physical, 0)
        } else {
            // Clock went backwards or stayed same: increment counter
            let counter = self.last_counter.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            (*last_ms, counter)
        };

        Hlc::new(wall_ms, counter, self.node_id)
    }

    /// Advances the clock past `seen`, so every later `now()` sorts after it.
    ///
    /// Used to resume after timestamps persisted by an earlier run whose
    /// wall clock was ahead of this one.
    pub fn observe(&self, seen: &Hlc) {
        let mut last_ms = self.last_wall_ms.lock().unwrap_or_else(|e| e.into_inner());
        if seen.wall_ms > *last_ms {
            *last_ms = seen.wall_ms;
            self.last_counter.store(seen.counter, AtomicOrdering::SeqCst);
        } else if seen.wall_ms == *last_ms {
            self.last_counter.fetch_max(seen.counter, AtomicOrdering::SeqCst);
        }
    }
}

#[cfg(test)]
#[path = "hlc_tests.rs"]
mod tests;
