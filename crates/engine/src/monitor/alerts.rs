// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Threshold alerts over performance summaries.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::PerformanceSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Number of queries classified slow or very slow.
    SlowQueries,
    /// Overall error rate, in percent.
    HighErrorRate,
    /// Overall performance score.
    LowPerformanceScore,
}

impl AlertKind {
    pub const ALL: [AlertKind; 3] =
        [AlertKind::SlowQueries, AlertKind::HighErrorRate, AlertKind::LowPerformanceScore];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::SlowQueries => "slow_queries",
            AlertKind::HighErrorRate => "high_error_rate",
            AlertKind::LowPerformanceScore => "low_performance_score",
        }
    }

    pub fn default_config(&self) -> AlertConfig {
        match self {
            AlertKind::SlowQueries => AlertConfig::new(3.0, 15),
            AlertKind::HighErrorRate => AlertConfig::new(5.0, 10),
            AlertKind::LowPerformanceScore => AlertConfig::new(60.0, 30),
        }
    }

    fn observe(&self, summary: &PerformanceSummary) -> f64 {
        match self {
            AlertKind::SlowQueries => (summary.slow_queries + summary.very_slow_queries) as f64,
            AlertKind::HighErrorRate => summary.error_rate,
            AlertKind::LowPerformanceScore => summary.performance_score,
        }
    }

    fn breached(&self, observed: f64, threshold: f64) -> bool {
        match self {
            AlertKind::SlowQueries => observed >= threshold,
            AlertKind::HighErrorRate => observed > threshold,
            AlertKind::LowPerformanceScore => observed < threshold,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub cooldown_minutes: u64,
}

fn default_enabled() -> bool {
    true
}

impl AlertConfig {
    pub fn new(threshold: f64, cooldown_minutes: u64) -> Self {
        AlertConfig { threshold, enabled: true, cooldown_minutes }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

pub fn default_alerts() -> BTreeMap<AlertKind, AlertConfig> {
    AlertKind::ALL.iter().map(|kind| (*kind, kind.default_config())).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub observed: f64,
    pub threshold: f64,
    pub fired_at: DateTime<Utc>,
    pub message: String,
}

/// Alert configuration plus the last time each kind fired.
#[derive(Debug, Default)]
pub(crate) struct AlertRegistry {
    configs: BTreeMap<AlertKind, AlertConfig>,
    last_fired: HashMap<AlertKind, DateTime<Utc>>,
}

impl AlertRegistry {
    pub(crate) fn new(configs: BTreeMap<AlertKind, AlertConfig>) -> Self {
        AlertRegistry { configs, last_fired: HashMap::new() }
    }

    pub(crate) fn configure(&mut self, kind: AlertKind, config: AlertConfig) {
        self.configs.insert(kind, config);
    }

    pub(crate) fn config(&self, kind: AlertKind) -> AlertConfig {
        self.configs.get(&kind).cloned().unwrap_or_else(|| kind.default_config())
    }

    /// Returns the alerts that fire for `summary` at `now`, recording each.
    ///
    /// A kind that fired within its cooldown stays quiet even if still breached.
    pub(crate) fn evaluate(
        &mut self,
        summary: &PerformanceSummary,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut fired = Vec::new();
        for (kind, config) in &self.configs {
            if !config.enabled {
                continue;
            }
            let observed = kind.observe(summary);
            if !kind.breached(observed, config.threshold) {
                continue;
            }
            let cooldown = ChronoDuration::minutes(config.cooldown_minutes as i64);
            if let Some(last) = self.last_fired.get(kind) {
                if now < *last + cooldown {
                    continue;
                }
            }
            self.last_fired.insert(*kind, now);
            fired.push(Alert {
                kind: *kind,
                observed,
                threshold: config.threshold,
                fired_at: now,
                message: message(*kind, observed, config.threshold),
            });
        }
        fired
    }

    pub(crate) fn reset_cooldowns(&mut self) {
        self.last_fired.clear();
    }
}

fn message(kind: AlertKind, observed: f64, threshold: f64) -> String {
    match kind {
        AlertKind::SlowQueries => {
            format!("{observed:.0} slow queries (threshold {threshold:.0})")
        }
        AlertKind::HighErrorRate => {
            format!("error rate {observed:.1}% exceeds {threshold:.1}%")
        }
        AlertKind::LowPerformanceScore => {
            format!("performance score {observed:.0} below {threshold:.0}")
        }
    }
}

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;
