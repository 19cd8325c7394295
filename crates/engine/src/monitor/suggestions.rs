// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optimization suggestions derived from query metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::metrics::{Latency, QueryPerformanceMetrics, StatusThresholds};

/// Heuristics that decide which queries deserve a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionSettings {
    /// Queries with fewer executions are not judged.
    pub min_executions: u64,
    /// Average results per execution above which pagination is suggested.
    pub large_result_threshold: f64,
    /// Execution count above which caching is suggested.
    pub frequent_execution_threshold: u64,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        SuggestionSettings {
            min_executions: 5,
            large_result_threshold: 100.0,
            frequent_execution_threshold: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Restructure,
    Reliability,
    Indexing,
    Pagination,
    Caching,
}

/// Declared in urgency order so sorting puts High first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSuggestion {
    pub category: SuggestionCategory,
    pub priority: SuggestionPriority,
    pub effort: Effort,
    pub title: String,
    pub description: String,
    pub affected_queries: Vec<String>,
}

/// Groups qualifying queries by category and emits one suggestion per
/// non-empty group, most urgent first.
pub(crate) fn derive(
    metrics: &[QueryPerformanceMetrics],
    thresholds: &StatusThresholds,
    settings: &SuggestionSettings,
) -> Vec<OptimizationSuggestion> {
    let mut groups: BTreeMap<SuggestionCategory, Vec<String>> = BTreeMap::new();
    for m in metrics.iter().filter(|m| m.execution_count >= settings.min_executions) {
        let latency = m.latency(thresholds);
        let mut push = |category| groups.entry(category).or_default().push(m.query_id.clone());

        match latency {
            Latency::VerySlow => push(SuggestionCategory::Restructure),
            Latency::Slow => push(SuggestionCategory::Indexing),
            Latency::Fast | Latency::Moderate => {}
        }
        if m.is_unreliable(thresholds) {
            push(SuggestionCategory::Reliability);
        }
        if m.average_result_count() > settings.large_result_threshold {
            push(SuggestionCategory::Pagination);
        }
        if m.execution_count >= settings.frequent_execution_threshold && latency > Latency::Fast {
            push(SuggestionCategory::Caching);
        }
    }

    let mut suggestions: Vec<OptimizationSuggestion> = groups
        .into_iter()
        .map(|(category, mut affected)| {
            affected.sort();
            suggestion(category, affected)
        })
        .collect();
    suggestions.sort_by_key(|s| (s.priority, s.category));
    suggestions
}

fn suggestion(
    category: SuggestionCategory,
    affected_queries: Vec<String>,
) -> OptimizationSuggestion {
    let n = affected_queries.len();
    let (priority, effort, title, description) = match category {
        SuggestionCategory::Restructure => (
            SuggestionPriority::High,
            Effort::High,
            "Restructure very slow queries",
            format!(
                "{n} queries average above the very-slow threshold; \
                 split them or denormalize the data they read"
            ),
        ),
        SuggestionCategory::Reliability => (
            SuggestionPriority::High,
            Effort::Medium,
            "Investigate failing queries",
            format!(
                "{n} queries fail often enough to be unreliable; \
                 check permissions and remote quotas"
            ),
        ),
        SuggestionCategory::Indexing => (
            SuggestionPriority::Medium,
            Effort::Low,
            "Add indexes for slow queries",
            format!(
                "{n} queries average above the slow threshold; \
                 a composite index on their filter fields usually helps"
            ),
        ),
        SuggestionCategory::Pagination => (
            SuggestionPriority::Medium,
            Effort::Low,
            "Paginate large result sets",
            format!("{n} queries return large pages; set a limit and follow page tokens"),
        ),
        SuggestionCategory::Caching => (
            SuggestionPriority::Low,
            Effort::Low,
            "Cache frequently executed queries",
            format!(
                "{n} queries run very often; serve them from the local cache with a longer TTL"
            ),
        ),
    };
    OptimizationSuggestion {
        category,
        priority,
        effort,
        title: title.to_string(),
        description,
        affected_queries,
    }
}

#[cfg(test)]
#[path = "suggestions_tests.rs"]
mod tests;
