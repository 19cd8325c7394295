// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `harbor write`, `harbor queue` and `harbor conflicts`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

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

fn write(temp: &TempDir, doc: &str, kind: &str, payload: Option<&str>, priority: &str) -> String {
    let mut cmd = harbor(temp);
    cmd.args(["write", "visits", doc, kind]);
    if let Some(payload) = payload {
        cmd.arg(payload);
    }
    let output = cmd.args(["-p", priority]).output().unwrap();
    assert!(output.status.success(), "write failed: {output:?}");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn queued(temp: &TempDir) -> Vec<Value> {
    let output = harbor(temp).args(["queue", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice::<Value>(&output.stdout).unwrap().as_array().unwrap().clone()
}

fn queued_docs(temp: &TempDir) -> Vec<String> {
    queued(temp).iter().map(|op| op["document_id"].as_str().unwrap().to_string()).collect()
}

#[test]
fn write_prints_operation_id() {
    let temp = TempDir::new().unwrap();
    let id = write(&temp, "v1", "create", Some(r#"{"clinic": "north"}"#), "medium");

    let parts: Vec<&str> = id.split('-').collect();
    assert_eq!(parts.len(), 3, "unexpected id {id}");
    let queued_id = &queued(&temp)[0]["id"];
    let rendered =
        format!("{}-{}-{}", queued_id["wall_ms"], queued_id["counter"], queued_id["node_id"]);
    assert_eq!(rendered, id);
}

#[test]
fn replay_order_follows_priority() {
    let temp = TempDir::new().unwrap();
    write(&temp, "op1", "create", Some("{}"), "high");
    write(&temp, "op2", "create", Some("{}"), "critical");
    write(&temp, "op3", "create", Some("{}"), "low");

    assert_eq!(queued_docs(&temp), ["op2", "op1", "op3"]);
}

#[test]
fn same_priority_keeps_enqueue_order() {
    let temp = TempDir::new().unwrap();
    for doc in ["a", "b", "c"] {
        write(&temp, doc, "create", Some("{}"), "medium");
    }
    assert_eq!(queued_docs(&temp), ["a", "b", "c"]);
}

#[test]
fn document_operations_never_reorder() {
    let temp = TempDir::new().unwrap();
    write(&temp, "v1", "create", Some(r#"{"n": 1}"#), "low");
    write(&temp, "v2", "create", Some("{}"), "high");
    write(&temp, "v1", "delete", None, "critical");

    let ops = queued(&temp);
    let order: Vec<(&str, &str)> = ops
        .iter()
        .map(|op| (op["document_id"].as_str().unwrap(), op["kind"].as_str().unwrap()))
        .collect();
    assert_eq!(order, [("v1", "create"), ("v1", "delete"), ("v2", "create")]);
}

#[test]
fn writes_update_the_cache_optimistically() {
    let temp = TempDir::new().unwrap();
    write(&temp, "v1", "create", Some(r#"{"clinic": "north", "room": 1}"#), "medium");
    write(&temp, "v1", "update", Some(r#"{"room": 2}"#), "medium");

    let output = harbor(&temp).args(["get", "visits/v1"]).output().unwrap();
    let cached: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cached, json!({"clinic": "north", "room": 2}));

    write(&temp, "v1", "delete", None, "medium");
    harbor(&temp).args(["get", "visits/v1"]).assert().failure();
}

#[test]
fn create_without_payload_is_rejected() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .args(["write", "visits", "v1", "create"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires an object payload"));
    harbor(&temp).arg("queue").assert().success().stdout("no pending operations\n");
}

#[test]
fn blank_resource_path_is_rejected() {
    let temp = TempDir::new().unwrap();
    harbor(&temp)
        .args(["write", " ", "v1", "create", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("resource path is empty"));
}

#[test]
fn conflicts_start_empty() {
    let temp = TempDir::new().unwrap();
    harbor(&temp).arg("conflicts").assert().success().stdout("no conflicts\n");
    harbor(&temp)
        .args(["conflicts", "--clear"])
        .assert()
        .success()
        .stdout("no conflicts\ncleared 0 conflicts\n");
    harbor(&temp).args(["conflicts", "-o", "json"]).assert().success().stdout("[]\n");
}
