// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    critical = { "critical", Priority::Critical },
    high = { "high", Priority::High },
    medium = { "MEDIUM", Priority::Medium },
    low = { "Low", Priority::Low },
)]
fn priority_parse(input: &str, expected: Priority) {
    assert_eq!(input.parse::<Priority>().unwrap(), expected);
}

#[test]
fn priority_parse_rejects_unknown() {
    let err = "urgent".parse::<Priority>().unwrap_err();
    assert!(matches!(err, Error::InvalidPriority(_)));
}

#[test]
fn priority_ordering_matches_importance() {
    assert!(Priority::Critical > Priority::High);
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
}

#[test]
fn priority_all_is_sorted_by_rank() {
    let ranks: Vec<u8> = Priority::ALL.iter().map(Priority::rank).collect();
    assert_eq!(ranks, vec![0, 1, 2, 3]);
}

#[test]
fn priority_serde_uses_lowercase() {
    let json = serde_json::to_string(&Priority::Critical).unwrap();
    assert_eq!(json, "\"critical\"");
    let back: Priority = serde_json::from_str("\"low\"").unwrap();
    assert_eq!(back, Priority::Low);
}
