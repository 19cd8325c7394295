// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use harbor_core::Priority;
use serde_json::{json, Value};

use super::*;
use crate::commands::testing::{capture, TestContext};

#[test]
fn put_then_get_prints_payload() {
    let ctx = TestContext::new();
    let printed = capture(|out| {
        put(&ctx.store, "patient:42", r#"{"name": "Ada"}"#, Priority::High, None, out)
    });
    assert!(printed.starts_with("stored patient:42  high  expires "));

    let printed = capture(|out| get(&ctx.store, "patient:42", OutputFormat::Text, out));
    let value: Value = serde_json::from_str(&printed).unwrap();
    assert_eq!(value, json!({"name": "Ada"}));
}

#[test]
fn get_json_includes_entry_metadata() {
    let ctx = TestContext::new();
    ctx.put("k", json!(1), Priority::Critical);

    let printed = capture(|out| get(&ctx.store, "k", OutputFormat::Json, out));
    let value: Value = serde_json::from_str(&printed).unwrap();
    assert_eq!(value["key"], "k");
    assert_eq!(value["priority"], "critical");
    assert_eq!(value["payload"], 1);
}

#[test]
fn get_missing_key_is_not_found() {
    let ctx = TestContext::new();
    let mut out = Vec::new();
    let err = get(&ctx.store, "nope", OutputFormat::Text, &mut out).unwrap_err();
    assert!(matches!(err, Error::NotFound(key) if key == "nope"));
}

#[test]
fn get_expired_entry_is_not_found() {
    let ctx = TestContext::new();
    ctx.put("k", json!(1), Priority::Low);
    ctx.clock.advance(Duration::from_secs(3601));

    let mut out = Vec::new();
    assert!(get(&ctx.store, "k", OutputFormat::Text, &mut out).is_err());
}

#[test]
fn put_rejects_invalid_json() {
    let ctx = TestContext::new();
    let mut out = Vec::new();
    let err = put(&ctx.store, "k", "{not json", Priority::Medium, None, &mut out).unwrap_err();
    assert!(matches!(err, Error::InvalidPayload(_)));
    assert!(ctx.store.cache.retrieve("k").unwrap().is_none());
}

#[test]
fn put_with_explicit_ttl_overrides_priority_default() {
    let ctx = TestContext::new();
    let mut out = Vec::new();
    put(&ctx.store, "k", "true", Priority::Critical, Some(10), &mut out).unwrap();

    ctx.clock.advance(Duration::from_secs(11));
    assert!(ctx.store.cache.retrieve("k").unwrap().is_none());
}

#[test]
fn put_with_zero_ttl_is_rejected() {
    let ctx = TestContext::new();
    let mut out = Vec::new();
    let err = put(&ctx.store, "k", "true", Priority::Low, Some(0), &mut out).unwrap_err();
    assert!(matches!(err, Error::Core(e) if e.is_validation()));
}

#[test]
fn stats_text_lists_every_tier() {
    let ctx = TestContext::new();
    ctx.put("a", json!(1), Priority::High).put("b", json!(2), Priority::Medium).put(
        "c",
        json!(3),
        Priority::Medium,
    );

    let printed = capture(|out| stats(&ctx.store, OutputFormat::Text, out));
    assert_eq!(printed, "total: 3\ncritical: 0\nhigh: 1\nmedium: 2\nlow: 0\n");
}

#[test]
fn stats_json_is_parseable() {
    let ctx = TestContext::new();
    ctx.put("a", json!(1), Priority::Low);

    let printed = capture(|out| stats(&ctx.store, OutputFormat::Json, out));
    let value: Value = serde_json::from_str(&printed).unwrap();
    assert_eq!(value["total_entries"], 1);
    assert_eq!(value["entries_by_priority"]["low"], 1);
}

#[test]
fn sweep_reports_removed_count() {
    let ctx = TestContext::new();
    ctx.put("short", json!(1), Priority::Low).put("long", json!(2), Priority::Critical);
    ctx.clock.advance(Duration::from_secs(2 * 3600));

    let printed = capture(|out| sweep(&ctx.store, out));
    assert_eq!(printed, "removed 1 expired entries\n");
    assert_eq!(ctx.store.cache.stats().unwrap().total_entries, 1);
}

#[test]
fn entries_skip_expired() {
    let ctx = TestContext::new();
    ctx.put("short", json!(1), Priority::Low).put("long", json!(2), Priority::High);
    ctx.clock.advance(Duration::from_secs(2 * 3600));

    let printed = capture(|out| entries(&ctx.store, OutputFormat::Text, out));
    assert!(printed.starts_with("long  high  expires "));
    assert!(!printed.contains("short"));
}

#[test]
fn remove_and_clear() {
    let ctx = TestContext::new();
    ctx.put("a", json!(1), Priority::Low).put("b", json!(2), Priority::Low);

    assert_eq!(capture(|out| remove(&ctx.store, "a", out)), "removed a\n");
    let mut out = Vec::new();
    assert!(matches!(remove(&ctx.store, "a", &mut out), Err(Error::NotFound(_))));

    assert_eq!(capture(|out| clear(&ctx.store, out)), "removed 1 entries\n");
    assert_eq!(ctx.store.cache.stats().unwrap().total_entries, 0);
}
