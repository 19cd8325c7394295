// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::time::Duration;
use yare::parameterized;

fn summary(error_rate: f64, slow: usize, score: f64) -> PerformanceSummary {
    PerformanceSummary {
        total_queries: 10,
        total_executions: 100,
        total_errors: error_rate as u64,
        error_rate,
        average_duration: Duration::from_millis(200),
        slow_queries: slow,
        very_slow_queries: 0,
        unreliable_queries: 0,
        active_connections: 0,
        active_listeners: 0,
        performance_score: score,
        generated_at: t(0),
    }
}

fn t(minutes: i64) -> DateTime<Utc> {
    harbor_core::hlc::millis_to_datetime(1_700_000_000_000) + ChronoDuration::minutes(minutes)
}

fn registry(kind: AlertKind, config: AlertConfig) -> AlertRegistry {
    let mut configs = BTreeMap::new();
    configs.insert(kind, config);
    AlertRegistry::new(configs)
}

#[parameterized(
    error_rate_over = { AlertKind::HighErrorRate, summary(7.5, 0, 90.0), true },
    error_rate_at = { AlertKind::HighErrorRate, summary(5.0, 0, 90.0), false },
    slow_at = { AlertKind::SlowQueries, summary(0.0, 3, 90.0), true },
    slow_under = { AlertKind::SlowQueries, summary(0.0, 2, 90.0), false },
    score_under = { AlertKind::LowPerformanceScore, summary(0.0, 0, 42.0), true },
    score_at = { AlertKind::LowPerformanceScore, summary(0.0, 0, 60.0), false },
)]
fn default_thresholds(kind: AlertKind, summary: PerformanceSummary, fires: bool) {
    let mut registry = registry(kind, kind.default_config());
    assert_eq!(!registry.evaluate(&summary, t(0)).is_empty(), fires);
}

#[test]
fn cooldown_suppresses_repeat_then_fires_after() {
    let mut registry = registry(AlertKind::HighErrorRate, AlertConfig::new(5.0, 10));
    let breached = summary(12.0, 0, 80.0);

    let first = registry.evaluate(&breached, t(0));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].kind, AlertKind::HighErrorRate);
    assert!(first[0].message.contains("12.0%"));

    assert!(registry.evaluate(&breached, t(5)).is_empty());
    assert!(registry.evaluate(&breached, t(9)).is_empty());
    assert_eq!(registry.evaluate(&breached, t(10)).len(), 1);
}

#[test]
fn disabled_alert_never_fires() {
    let mut registry =
        registry(AlertKind::HighErrorRate, AlertConfig::new(1.0, 10).disabled());
    assert!(registry.evaluate(&summary(50.0, 0, 0.0), t(0)).is_empty());
}

#[test]
fn reset_cooldowns_allows_immediate_refire() {
    let mut registry = registry(AlertKind::SlowQueries, AlertConfig::new(1.0, 60));
    let breached = summary(0.0, 4, 80.0);
    assert_eq!(registry.evaluate(&breached, t(0)).len(), 1);
    registry.reset_cooldowns();
    assert_eq!(registry.evaluate(&breached, t(1)).len(), 1);
}

#[test]
fn unconfigured_kind_reports_default() {
    let registry = AlertRegistry::default();
    assert_eq!(registry.config(AlertKind::LowPerformanceScore).threshold, 60.0);
}

#[test]
fn config_deserializes_without_enabled() {
    let config: AlertConfig =
        serde_json::from_str(r#"{"threshold": 2.0, "cooldown_minutes": 1}"#).unwrap();
    assert!(config.enabled);
}
