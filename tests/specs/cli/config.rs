// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for configuration loading and `harbor config`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn harbor() -> Command {
    let mut cmd = cargo_bin_cmd!("harbor");
    cmd.env_remove("HARBOR_DB").env_remove("HARBOR_CONFIG").env_remove("HARBOR_LOG");
    cmd
}

fn with_config(temp: &TempDir, text: &str) -> Command {
    let config = temp.path().join("harbor.toml");
    fs::write(&config, text).unwrap();
    let mut cmd = harbor();
    cmd.arg("--db").arg(temp.path().join("harbor.db")).arg("--config").arg(config);
    cmd
}

#[test]
fn show_prints_defaults_for_empty_file() {
    let temp = TempDir::new().unwrap();
    with_config(&temp, "")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("critical_secs = 604800"))
        .stdout(predicate::str::contains("max_connections = 10"))
        .stdout(predicate::str::contains("max_listeners = 5"))
        .stdout(predicate::str::contains("debounce_ms = 2000"));
}

#[test]
fn show_reflects_overrides() {
    let temp = TempDir::new().unwrap();
    with_config(&temp, "[cache]\nlow_secs = 120\n\n[pools]\nmax_connections = 3\n")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("low_secs = 120"))
        .stdout(predicate::str::contains("max_connections = 3"));
}

#[test]
fn configured_ttl_applies_to_puts() {
    let temp = TempDir::new().unwrap();
    with_config(&temp, "[cache]\nlow_secs = 1\n")
        .args(["put", "k", "1", "-p", "low"])
        .assert()
        .success();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    with_config(&temp, "[cache]\nlow_secs = 1\n").args(["get", "k"]).assert().failure();
    with_config(&temp, "[cache]\nlow_secs = 1\n")
        .arg("sweep")
        .assert()
        .success()
        .stdout("removed 1 expired entries\n");
}

#[test]
fn invalid_values_are_rejected() {
    let temp = TempDir::new().unwrap();
    with_config(&temp, "[cache]\nmedium_secs = 0\n")
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache TTLs must be positive"));
}

#[test]
fn malformed_toml_names_the_file() {
    let temp = TempDir::new().unwrap();
    with_config(&temp, "[cache\n")
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"))
        .stderr(predicate::str::contains("harbor.toml"));
}

#[test]
fn missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();
    harbor()
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read config"));
}

#[test]
fn environment_selects_store_and_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("harbor.toml");
    fs::write(&config, "").unwrap();
    let db = temp.path().join("env.db");

    harbor()
        .env("HARBOR_DB", &db)
        .env("HARBOR_CONFIG", &config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("config: {}", config.display())))
        .stdout(predicate::str::contains(format!("store: {}", db.display())));
}

#[test]
fn database_parent_directory_is_created() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("harbor.toml");
    fs::write(&config, "").unwrap();
    let db = temp.path().join("nested").join("dir").join("harbor.db");

    harbor().arg("--db").arg(&db).arg("--config").arg(&config).arg("stats").assert().success();
    assert!(db.exists());
}
