// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Every section deserializes with defaults, so an empty file (or no file)
//! yields a working configuration. The CLI loads this from `harbor.toml`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use harbor_core::TtlPolicy;

use crate::error::{Error, Result};
use crate::monitor::{
    default_alerts, AlertConfig, AlertKind, ScoreWeights, StatusThresholds, SuggestionSettings,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
    pub pools: PoolConfig,
    pub performance: PerformanceConfig,
}

impl Config {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::Config(msg.to_string()));

        let ttl = &self.cache.ttl;
        if [ttl.critical_secs, ttl.high_secs, ttl.medium_secs, ttl.low_secs].contains(&0) {
            return invalid("cache TTLs must be positive");
        }
        if self.cache.sweep_interval_secs == 0 {
            return invalid("cache.sweep_interval_secs must be positive");
        }
        if self.sync.retry_initial_delay_ms == 0 {
            return invalid("sync.retry_initial_delay_ms must be positive");
        }
        if self.pools.max_connections == 0 || self.pools.max_listeners == 0 {
            return invalid("pool sizes must be positive");
        }
        if self
            .pools
            .connection_overrides
            .values()
            .chain(self.pools.listener_overrides.values())
            .any(|n| *n == 0)
        {
            return invalid("pool overrides must be positive");
        }
        let t = &self.performance.thresholds;
        let ascending = t.good_duration_ms <= t.slow_duration_ms
            && t.slow_duration_ms <= t.very_slow_duration_ms;
        if !ascending {
            return invalid("performance duration thresholds must be ascending");
        }
        if t.good_error_rate > t.unreliable_error_rate {
            return invalid("performance.thresholds.good_error_rate exceeds unreliable_error_rate");
        }
        if self.performance.summary_interval_secs == 0 {
            return invalid("performance.summary_interval_secs must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(flatten)]
    pub ttl: TtlPolicy,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl: TtlPolicy::default(), sweep_interval_secs: 300 }
    }
}

impl CacheConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Node id stamped into operation ids.
    pub node_id: u32,
    /// Delay before the first retry after a failed drain.
    pub retry_initial_delay_ms: u64,
    /// Cap on the doubling retry delay.
    pub retry_max_delay_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { node_id: 1, retry_initial_delay_ms: 1_000, retry_max_delay_secs: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Raw signals must hold this long before listeners hear about them.
    pub debounce_ms: u64,
    /// How often an installed reachability probe runs.
    pub probe_interval_secs: u64,
    pub start_online: bool,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig { debounce_ms: 2_000, probe_interval_secs: 30, start_online: true }
    }
}

impl ConnectivityConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: usize,
    pub max_listeners: usize,
    /// Bound on waiting for a slot; unset waits indefinitely.
    pub acquire_timeout_ms: Option<u64>,
    /// Per resource path connection limits.
    pub connection_overrides: HashMap<String, usize>,
    /// Per resource path listener limits.
    pub listener_overrides: HashMap<String, usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_connections: 10,
            max_listeners: 5,
            acquire_timeout_ms: Some(30_000),
            connection_overrides: HashMap::new(),
            listener_overrides: HashMap::new(),
        }
    }
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub summary_interval_secs: u64,
    pub thresholds: StatusThresholds,
    pub score: ScoreWeights,
    pub suggestions: SuggestionSettings,
    pub alerts: BTreeMap<AlertKind, AlertConfig>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            summary_interval_secs: 60,
            thresholds: StatusThresholds::default(),
            score: ScoreWeights::default(),
            suggestions: SuggestionSettings::default(),
            alerts: default_alerts(),
        }
    }
}

impl PerformanceConfig {
    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
