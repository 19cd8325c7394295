// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for the `harbor` cache commands: put, get, stats, entries,
//! sweep, remove and clear.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use yare::parameterized;

/// A temp dir holding an empty config file and the store.
fn harbor(temp: &TempDir) -> Command {
    let config = temp.path().join("harbor.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    let mut cmd = cargo_bin_cmd!("harbor");
    cmd.arg("--db").arg(temp.path().join("harbor.db")).arg("--config").arg(config);
    cmd.env_remove("HARBOR_DB").env_remove("HARBOR_CONFIG").env_remove("HARBOR_LOG");
    cmd
}

fn stdout_json(temp: &TempDir, args: &[&str]) -> Value {
    let output = harbor(temp).args(args).output().unwrap();
    assert!(output.status.success(), "harbor {args:?} failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Store and retrieve
// =============================================================================

#[test]
fn put_then_get_returns_payload() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .args(["put", "patient:42", r#"{"name": "Ada"}"#, "--priority", "high"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("stored patient:42  high  expires "));

    let value = stdout_json(&temp, &["get", "patient:42"]);
    assert_eq!(value, serde_json::json!({"name": "Ada"}));
}

#[test]
fn get_json_output_includes_priority_and_expiry() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "k", "[1, 2]", "-p", "critical"]).assert().success();

    let entry = stdout_json(&temp, &["get", "k", "-o", "json"]);
    assert_eq!(entry["priority"], "critical");
    assert_eq!(entry["payload"], serde_json::json!([1, 2]));
    assert!(entry["expires_at"].as_str().unwrap() > entry["created_at"].as_str().unwrap());
}

#[test]
fn get_missing_key_fails() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .args(["get", "patient:404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache entry not found: patient:404"));
}

#[test]
fn put_invalid_json_fails_with_hint() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .args(["put", "k", "{name: Ada}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON payload"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn put_zero_ttl_is_rejected() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "k", "1", "--ttl", "0"]).assert().failure();
}

#[test]
fn put_unknown_priority_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .args(["put", "k", "1", "--priority", "urgent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'urgent'"));
}

// =============================================================================
// Statistics
// =============================================================================

#[parameterized(
    critical = { "critical" },
    high = { "high" },
    medium = { "medium" },
    low = { "low" },
)]
fn stats_count_entries_by_priority(priority: &str) {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "a", "1", "-p", priority]).assert().success();
    harbor(&temp).args(["put", "b", "2", "-p", priority]).assert().success();

    let stats = stdout_json(&temp, &["stats", "-o", "json"]);
    assert_eq!(stats["total_entries"], 2);
    assert_eq!(stats["entries_by_priority"][priority], 2);
}

#[test]
fn stats_text_on_empty_store() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .arg("stats")
        .assert()
        .success()
        .stdout("total: 0\ncritical: 0\nhigh: 0\nmedium: 0\nlow: 0\n");
}

#[test]
fn overwriting_a_key_moves_it_between_tiers() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "k", "1", "-p", "low"]).assert().success();
    harbor(&temp).args(["put", "k", "2", "-p", "high"]).assert().success();

    let stats = stdout_json(&temp, &["stats", "-o", "json"]);
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["entries_by_priority"]["low"], 0);
    assert_eq!(stats["entries_by_priority"]["high"], 1);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn entries_lists_live_keys() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "a", "1"]).assert().success();
    harbor(&temp).args(["put", "b", "2"]).assert().success();

    let entries = stdout_json(&temp, &["entries", "-o", "json"]);
    let keys: Vec<&str> =
        entries.as_array().unwrap().iter().map(|e| e["key"].as_str().unwrap()).collect();
    assert_eq!(keys, ["a", "b"]);
}

#[test]
fn sweep_keeps_unexpired_entries() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "a", "1"]).assert().success();
    harbor(&temp).arg("sweep").assert().success().stdout("removed 0 expired entries\n");
    harbor(&temp).args(["get", "a"]).assert().success();
}

#[test]
fn remove_then_get_fails() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).args(["put", "a", "1"]).assert().success();
    harbor(&temp).args(["remove", "a"]).assert().success().stdout("removed a\n");
    harbor(&temp).args(["get", "a"]).assert().failure();
    harbor(&temp).args(["remove", "a"]).assert().failure();
}

#[test]
fn clear_removes_everything() {
    let temp = TempDir::new().unwrap();
    for key in ["a", "b", "c"] {
        harbor(&temp).args(["put", key, "null"]).assert().success();
    }
    harbor(&temp).arg("clear").assert().success().stdout("removed 3 entries\n");

    let stats = stdout_json(&temp, &["stats", "-o", "json"]);
    assert_eq!(stats["total_entries"], 0);
}
