// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Query performance monitoring.
//!
//! Pools report every remote call here. The monitor keeps per-query
//! metrics, classifies queries, produces summaries and suggestions, and
//! fires threshold alerts. Recording never fails and never blocks on I/O.

mod alerts;
mod metrics;
mod suggestions;

pub use alerts::{default_alerts, Alert, AlertConfig, AlertKind};
pub use metrics::{QueryPerformanceMetrics, QueryStatus, StatusThresholds};
pub use suggestions::{
    Effort, OptimizationSuggestion, SuggestionCategory, SuggestionPriority, SuggestionSettings,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

use harbor_core::ClockSource;

use crate::config::PerformanceConfig;
use crate::pool::PoolKind;
use crate::subscription::Subscription;

use alerts::AlertRegistry;
use metrics::Latency;

const CHANNEL_CAPACITY: usize = 64;

/// Penalty per unit when computing the performance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per percentage point of overall error rate.
    pub error_rate: f64,
    pub slow_query: f64,
    pub very_slow_query: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights { error_rate: 2.0, slow_query: 5.0, very_slow_query: 10.0 }
    }
}

/// Aggregate view over every tracked query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_queries: usize,
    pub total_executions: u64,
    pub total_errors: u64,
    /// Percent of all executions that failed.
    pub error_rate: f64,
    pub average_duration: Duration,
    pub slow_queries: usize,
    pub very_slow_queries: usize,
    pub unreliable_queries: usize,
    pub active_connections: usize,
    pub active_listeners: usize,
    /// 0 to 100, higher is healthier.
    pub performance_score: f64,
    pub generated_at: DateTime<Utc>,
}

pub struct PerformanceMonitor {
    thresholds: StatusThresholds,
    weights: ScoreWeights,
    suggestions: SuggestionSettings,
    clock: Arc<dyn ClockSource>,
    metrics: Mutex<HashMap<String, QueryPerformanceMetrics>>,
    alerts: Mutex<AlertRegistry>,
    active_connections: AtomicUsize,
    active_listeners: AtomicUsize,
    summary_tx: broadcast::Sender<PerformanceSummary>,
    alert_tx: broadcast::Sender<Alert>,
}

// Poisoning only means another recorder panicked mid-update; the counters
// are still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl PerformanceMonitor {
    pub fn new(config: &PerformanceConfig, clock: Arc<dyn ClockSource>) -> Self {
        let (summary_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (alert_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        PerformanceMonitor {
            thresholds: config.thresholds.clone(),
            weights: config.score.clone(),
            suggestions: config.suggestions.clone(),
            clock,
            metrics: Mutex::new(HashMap::new()),
            alerts: Mutex::new(AlertRegistry::new(config.alerts.clone())),
            active_connections: AtomicUsize::new(0),
            active_listeners: AtomicUsize::new(0),
            summary_tx,
            alert_tx,
        }
    }

    pub fn thresholds(&self) -> &StatusThresholds {
        &self.thresholds
    }

    /// Records one execution of `query_id`.
    pub fn record_execution(
        &self,
        query_id: &str,
        duration: Duration,
        success: bool,
        result_count: usize,
    ) {
        let now = self.clock.now();
        let mut metrics = lock(&self.metrics);
        if let Some(entry) = metrics.get_mut(query_id) {
            entry.record(duration, success, result_count, now);
        } else {
            let mut entry = QueryPerformanceMetrics::new(query_id);
            entry.record(duration, success, result_count, now);
            metrics.insert(query_id.to_string(), entry);
        }
        tracing::trace!(
            query = query_id,
            duration_ms = duration.as_millis() as u64,
            success,
            result_count,
            "recorded execution"
        );
    }

    pub fn metrics_for(&self, query_id: &str) -> Option<QueryPerformanceMetrics> {
        lock(&self.metrics).get(query_id).cloned()
    }

    pub fn status_of(&self, query_id: &str) -> Option<QueryStatus> {
        lock(&self.metrics).get(query_id).map(|m| m.status(&self.thresholds))
    }

    /// Every tracked query, ordered by id.
    pub fn all_metrics(&self) -> Vec<QueryPerformanceMetrics> {
        let mut all: Vec<_> = lock(&self.metrics).values().cloned().collect();
        all.sort_by(|a, b| a.query_id.cmp(&b.query_id));
        all
    }

    pub fn summary(&self) -> PerformanceSummary {
        let metrics = self.all_metrics();

        let mut total_executions = 0u64;
        let mut total_errors = 0u64;
        let mut total_duration = Duration::ZERO;
        let (mut slow, mut very_slow, mut unreliable) = (0usize, 0usize, 0usize);
        for m in &metrics {
            total_executions += m.execution_count;
            total_errors += m.error_count;
            total_duration = total_duration.saturating_add(m.total_duration);
            // Latency and reliability are counted independently.
            match m.latency(&self.thresholds) {
                Latency::VerySlow => very_slow += 1,
                Latency::Slow => slow += 1,
                Latency::Fast | Latency::Moderate => {}
            }
            if m.is_unreliable(&self.thresholds) {
                unreliable += 1;
            }
        }

        let error_rate = if total_executions == 0 {
            0.0
        } else {
            total_errors as f64 * 100.0 / total_executions as f64
        };
        let average_duration = if total_executions == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(total_duration.as_secs_f64() / total_executions as f64)
        };
        let score = 100.0
            - error_rate * self.weights.error_rate
            - slow as f64 * self.weights.slow_query
            - very_slow as f64 * self.weights.very_slow_query;

        PerformanceSummary {
            total_queries: metrics.len(),
            total_executions,
            total_errors,
            error_rate,
            average_duration,
            slow_queries: slow,
            very_slow_queries: very_slow,
            unreliable_queries: unreliable,
            active_connections: self.active_connections.load(Ordering::SeqCst),
            active_listeners: self.active_listeners.load(Ordering::SeqCst),
            performance_score: score.clamp(0.0, 100.0),
            generated_at: self.clock.now(),
        }
    }

    pub fn optimization_suggestions(&self) -> Vec<OptimizationSuggestion> {
        suggestions::derive(&self.all_metrics(), &self.thresholds, &self.suggestions)
    }

    pub fn configure_alert(&self, kind: AlertKind, config: AlertConfig) {
        tracing::debug!(
            %kind,
            threshold = config.threshold,
            enabled = config.enabled,
            "alert configured"
        );
        lock(&self.alerts).configure(kind, config);
    }

    pub fn alert_config(&self, kind: AlertKind) -> AlertConfig {
        lock(&self.alerts).config(kind)
    }

    /// Checks alert thresholds against a fresh summary and publishes any
    /// alert that is not in cooldown.
    pub fn evaluate_alerts(&self) -> Vec<Alert> {
        let summary = self.summary();
        self.evaluate_summary(&summary)
    }

    fn evaluate_summary(&self, summary: &PerformanceSummary) -> Vec<Alert> {
        let fired = lock(&self.alerts).evaluate(summary, self.clock.now());
        for alert in &fired {
            tracing::warn!(kind = %alert.kind, observed = alert.observed, "{}", alert.message);
            // No subscribers is fine.
            let _ = self.alert_tx.send(alert.clone());
        }
        fired
    }

    /// Builds a summary, publishes it, then evaluates alerts against it.
    pub fn publish_summary(&self) -> PerformanceSummary {
        let summary = self.summary();
        tracing::debug!(
            queries = summary.total_queries,
            score = summary.performance_score,
            "performance summary"
        );
        let _ = self.summary_tx.send(summary.clone());
        self.evaluate_summary(&summary);
        summary
    }

    pub fn summaries(&self) -> Subscription<PerformanceSummary> {
        Subscription::new(self.summary_tx.subscribe(), "performance_summary")
    }

    pub fn alerts(&self) -> Subscription<Alert> {
        Subscription::new(self.alert_tx.subscribe(), "alerts")
    }

    /// Forgets one query. Returns whether it was tracked.
    pub fn reset(&self, query_id: &str) -> bool {
        lock(&self.metrics).remove(query_id).is_some()
    }

    /// Forgets every query and alert cooldown. Pool gauges are live state
    /// and are left alone.
    pub fn reset_all(&self) {
        lock(&self.metrics).clear();
        lock(&self.alerts).reset_cooldowns();
        tracing::info!("performance metrics reset");
    }

    pub fn active(&self, kind: PoolKind) -> usize {
        self.gauge(kind).load(Ordering::SeqCst)
    }

    pub(crate) fn slot_acquired(&self, kind: PoolKind) {
        self.gauge(kind).fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn slot_released(&self, kind: PoolKind) {
        let _ = self
            .gauge(kind)
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    fn gauge(&self, kind: PoolKind) -> &AtomicUsize {
        match kind {
            PoolKind::Connection => &self.active_connections,
            PoolKind::Listener => &self.active_listeners,
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
