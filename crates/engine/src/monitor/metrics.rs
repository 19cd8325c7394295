// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-query execution metrics and status classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency and error-rate boundaries used to classify a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub good_duration_ms: u64,
    pub slow_duration_ms: u64,
    pub very_slow_duration_ms: u64,
    /// Percent. Below this (and fast) a query is Good.
    pub good_error_rate: f64,
    /// Percent. Above this a query is Unreliable regardless of latency.
    pub unreliable_error_rate: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        StatusThresholds {
            good_duration_ms: 500,
            slow_duration_ms: 2_000,
            very_slow_duration_ms: 5_000,
            good_error_rate: 1.0,
            unreliable_error_rate: 10.0,
        }
    }
}

/// Health classification of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Good,
    Fair,
    Slow,
    VerySlow,
    Unreliable,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Good => "good",
            QueryStatus::Fair => "fair",
            QueryStatus::Slow => "slow",
            QueryStatus::VerySlow => "very_slow",
            QueryStatus::Unreliable => "unreliable",
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latency bucket, independent of error rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Latency {
    Fast,
    Moderate,
    Slow,
    VerySlow,
}

/// Running totals for one query id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPerformanceMetrics {
    pub query_id: String,
    pub execution_count: u64,
    pub error_count: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub total_results: u64,
    pub last_executed: Option<DateTime<Utc>>,
}

impl QueryPerformanceMetrics {
    pub fn new(query_id: impl Into<String>) -> Self {
        QueryPerformanceMetrics {
            query_id: query_id.into(),
            execution_count: 0,
            error_count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::ZERO,
            max_duration: Duration::ZERO,
            total_results: 0,
            last_executed: None,
        }
    }

    pub(crate) fn record(
        &mut self,
        duration: Duration,
        success: bool,
        result_count: usize,
        at: DateTime<Utc>,
    ) {
        self.min_duration =
            if self.execution_count == 0 { duration } else { self.min_duration.min(duration) };
        self.max_duration = self.max_duration.max(duration);
        self.execution_count += 1;
        self.total_duration = self.total_duration.saturating_add(duration);
        self.total_results += result_count as u64;
        if !success {
            self.error_count += 1;
        }
        self.last_executed = Some(at);
    }

    pub fn average_duration(&self) -> Duration {
        match u32::try_from(self.execution_count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_duration / n,
            Err(_) => Duration::from_secs_f64(
                self.total_duration.as_secs_f64() / self.execution_count as f64,
            ),
        }
    }

    /// Failed executions as a percentage of all executions.
    pub fn error_rate(&self) -> f64 {
        if self.execution_count == 0 {
            return 0.0;
        }
        self.error_count as f64 * 100.0 / self.execution_count as f64
    }

    pub fn average_result_count(&self) -> f64 {
        if self.execution_count == 0 {
            return 0.0;
        }
        self.total_results as f64 / self.execution_count as f64
    }

    pub(crate) fn latency(&self, thresholds: &StatusThresholds) -> Latency {
        let avg = self.average_duration();
        if avg > Duration::from_millis(thresholds.very_slow_duration_ms) {
            Latency::VerySlow
        } else if avg > Duration::from_millis(thresholds.slow_duration_ms) {
            Latency::Slow
        } else if avg < Duration::from_millis(thresholds.good_duration_ms) {
            Latency::Fast
        } else {
            Latency::Moderate
        }
    }

    pub(crate) fn is_unreliable(&self, thresholds: &StatusThresholds) -> bool {
        self.error_rate() > thresholds.unreliable_error_rate
    }

    /// Classifies the query. Error rate is checked before latency, so a fast
    /// query that fails often is still Unreliable.
    pub fn status(&self, thresholds: &StatusThresholds) -> QueryStatus {
        if self.is_unreliable(thresholds) {
            return QueryStatus::Unreliable;
        }
        match self.latency(thresholds) {
            Latency::VerySlow => QueryStatus::VerySlow,
            Latency::Slow => QueryStatus::Slow,
            Latency::Fast if self.error_rate() < thresholds.good_error_rate => QueryStatus::Good,
            Latency::Fast | Latency::Moderate => QueryStatus::Fair,
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
