// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    timeout = {
        Error::PoolTimeout {
            kind: PoolKind::Connection,
            resource_path: "visits".into(),
            waited: Duration::from_millis(250),
        },
        "connection slot on 'visits'"
    },
    closed = {
        Error::PoolClosed { kind: PoolKind::Listener, resource_path: "visits".into() },
        "listener pool"
    },
    offline = { Error::Offline("visits".into()), "nothing cached" },
    remote = { Error::Remote(RemoteError::Unavailable("503".into())), "503" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn validation_passes_through_core() {
    let err: Error = harbor_core::Error::Validation("document id is empty".into()).into();
    assert!(err.is_validation());
    assert!(!Error::Offline("x".into()).is_validation());
}
