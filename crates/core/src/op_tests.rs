// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

fn op(wall_ms: u64, doc: &str, kind: OpKind, priority: Priority) -> OfflineOperation {
    OfflineOperation::new(
        Hlc::new(wall_ms, 0, 1),
        "patients",
        doc,
        kind,
        json!({ "doc": doc }),
        priority,
    )
}

fn ids(ops: &[OfflineOperation]) -> Vec<u64> {
    ops.iter().map(|o| o.id.wall_ms).collect()
}

#[parameterized(
    create = { "create", OpKind::Create },
    update = { "Update", OpKind::Update },
    delete = { "DELETE", OpKind::Delete },
)]
fn op_kind_parse(input: &str, expected: OpKind) {
    assert_eq!(input.parse::<OpKind>().unwrap(), expected);
}

#[test]
fn op_kind_parse_rejects_unknown() {
    assert!(matches!("upsert".parse::<OpKind>(), Err(Error::InvalidOpKind(_))));
}

#[test]
fn op_enqueued_at_follows_id() {
    let o = op(1_700_000_000_123, "a", OpKind::Create, Priority::Low);
    assert_eq!(o.enqueued_at.timestamp_millis(), 1_700_000_000_123);
}

#[test]
fn op_validate_accepts_delete_without_payload() {
    let mut o = op(1, "a", OpKind::Delete, Priority::Low);
    o.payload = Value::Null;
    assert!(o.validate().is_ok());
}

#[parameterized(
    empty_path = { "", "a", OpKind::Create, json!({}) },
    path_with_space = { "pat ients", "a", OpKind::Create, json!({}) },
    empty_document = { "patients", " ", OpKind::Update, json!({}) },
    create_null_payload = { "patients", "a", OpKind::Create, Value::Null },
    update_array_payload = { "patients", "a", OpKind::Update, json!([1, 2]) },
)]
fn op_validate_rejects(path: &str, doc: &str, kind: OpKind, payload: Value) {
    let o = OfflineOperation::new(Hlc::new(1, 0, 1), path, doc, kind, payload, Priority::Low);
    let err = o.validate().unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn replay_order_priority_then_enqueue_time() {
    // op1(Medium, A), op2(Critical, B), op3(Medium, A, later)
    let ops = vec![
        op(1000, "A", OpKind::Create, Priority::Medium),
        op(2000, "B", OpKind::Create, Priority::Critical),
        op(3000, "A", OpKind::Update, Priority::Medium),
    ];
    assert_eq!(ids(&replay_order(ops)), vec![2000, 1000, 3000]);
}

#[test]
fn replay_order_across_documents() {
    let ops = vec![
        op(1000, "low", OpKind::Create, Priority::Low),
        op(2000, "crit", OpKind::Create, Priority::Critical),
        op(3000, "med", OpKind::Create, Priority::Medium),
    ];
    assert_eq!(ids(&replay_order(ops)), vec![2000, 3000, 1000]);
}

#[test]
fn replay_order_never_inverts_same_document() {
    // A critical delete must not overtake the low-priority create it follows.
    let ops = vec![
        op(1000, "A", OpKind::Create, Priority::Low),
        op(2000, "B", OpKind::Create, Priority::High),
        op(3000, "A", OpKind::Delete, Priority::Critical),
    ];
    assert_eq!(ids(&replay_order(ops)), vec![1000, 3000, 2000]);
}

#[test]
fn replay_order_ignores_input_order() {
    let ops = vec![
        op(3000, "A", OpKind::Update, Priority::Medium),
        op(1000, "A", OpKind::Create, Priority::Medium),
    ];
    assert_eq!(ids(&replay_order(ops)), vec![1000, 3000]);
}

#[test]
fn replay_order_ties_broken_by_id() {
    let mut a = op(1000, "A", OpKind::Create, Priority::High);
    let mut b = op(1000, "B", OpKind::Create, Priority::High);
    a.id = Hlc::new(1000, 1, 1);
    b.id = Hlc::new(1000, 0, 1);
    let ordered = replay_order(vec![a, b]);
    assert_eq!(ordered[0].document_id, "B");
}

#[test]
fn document_key_display() {
    let o = op(1, "42", OpKind::Create, Priority::Low);
    assert_eq!(o.document_key().to_string(), "patients/42");
}
