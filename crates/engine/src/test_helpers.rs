// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

#![allow(clippy::panic)]

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use harbor_core::{OpId, OpKind};

use crate::remote::{
    ApplyOutcome, ApplyRequest, BoxFuture, Filter, QueryPage, QueryRequest, RemoteError,
    RemoteResult, RemoteStore, RemoteUpdate, UpdateStream,
};

pub(crate) const T0: u64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
struct Document {
    payload: Option<Value>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct MockState {
    documents: BTreeMap<(String, String), Document>,
    applied: HashSet<OpId>,
    apply_log: Vec<OpId>,
    apply_calls: usize,
    fail_applies: usize,
    failing_documents: HashSet<String>,
    fail_queries: bool,
    fail_subscribes: bool,
    apply_delay: Option<Duration>,
    in_flight: usize,
    peak_in_flight: usize,
    subscribers: Vec<(String, mpsc::UnboundedSender<RemoteUpdate>)>,
}

/// An in-memory remote store.
///
/// Applies are idempotent per op id and detect conflicts by comparing the
/// stored document's timestamp with the request's base timestamp.
#[derive(Clone, Default)]
pub(crate) struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// Simulates another client editing a document at `at`.
    pub(crate) fn edit_remotely(&self, path: &str, doc: &str, payload: Value, at: DateTime<Utc>) {
        self.state().documents.insert(
            (path.to_string(), doc.to_string()),
            Document { payload: Some(payload), updated_at: at },
        );
    }

    pub(crate) fn fail_next_applies(&self, n: usize) {
        self.state().fail_applies = n;
    }

    pub(crate) fn fail_document(&self, doc: &str) {
        self.state().failing_documents.insert(doc.to_string());
    }

    pub(crate) fn heal_document(&self, doc: &str) {
        self.state().failing_documents.remove(doc);
    }

    pub(crate) fn set_fail_queries(&self, fail: bool) {
        self.state().fail_queries = fail;
    }

    pub(crate) fn set_fail_subscribes(&self, fail: bool) {
        self.state().fail_subscribes = fail;
    }

    pub(crate) fn set_apply_delay(&self, delay: Duration) {
        self.state().apply_delay = Some(delay);
    }

    /// Op ids in the order they were first applied.
    pub(crate) fn applied(&self) -> Vec<OpId> {
        self.state().apply_log.clone()
    }

    pub(crate) fn apply_calls(&self) -> usize {
        self.state().apply_calls
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.state().peak_in_flight
    }

    pub(crate) fn document(&self, path: &str, doc: &str) -> Option<Value> {
        self.state()
            .documents
            .get(&(path.to_string(), doc.to_string()))
            .and_then(|d| d.payload.clone())
    }

    /// Pushes an update to every open subscription on `path`.
    pub(crate) fn push(&self, path: &str, update: RemoteUpdate) {
        let mut state = self.state();
        state.subscribers.retain(|(p, tx)| p != path || tx.send(update.clone()).is_ok());
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn merge(existing: Option<Value>, patch: Value) -> Value {
    match (existing, patch) {
        (Some(Value::Object(mut base)), Value::Object(patch)) => {
            base.extend(patch);
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

impl RemoteStore for MockRemote {
    fn apply(&self, request: ApplyRequest) -> BoxFuture<'_, RemoteResult<ApplyOutcome>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let delay = {
                let mut s = lock(&state);
                s.apply_calls += 1;
                s.in_flight += 1;
                s.peak_in_flight = s.peak_in_flight.max(s.in_flight);
                s.apply_delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut s = lock(&state);
            s.in_flight -= 1;
            if s.fail_applies > 0 {
                s.fail_applies -= 1;
                return Err(RemoteError::Unavailable("injected failure".into()));
            }
            if s.failing_documents.contains(&request.document_id) {
                return Err(RemoteError::Timeout);
            }
            if s.applied.contains(&request.op_id) {
                return Ok(ApplyOutcome::Applied);
            }

            let key = (request.resource_path.clone(), request.document_id.clone());
            let existing = s.documents.get(&key).cloned();
            if let Some(doc) = &existing {
                if doc.updated_at > request.base_timestamp {
                    return Ok(ApplyOutcome::Conflict { server_timestamp: doc.updated_at });
                }
            }
            let payload = match request.kind {
                OpKind::Create => Some(request.payload),
                OpKind::Update => Some(merge(existing.and_then(|d| d.payload), request.payload)),
                OpKind::Delete => None,
            };
            s.documents.insert(key, Document { payload, updated_at: request.base_timestamp });
            s.applied.insert(request.op_id);
            s.apply_log.push(request.op_id);
            Ok(ApplyOutcome::Applied)
        })
    }

    fn query(
        &self,
        resource_path: &str,
        request: QueryRequest,
    ) -> BoxFuture<'_, RemoteResult<QueryPage>> {
        let path = resource_path.to_string();
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let s = lock(&state);
            if s.fail_queries {
                return Err(RemoteError::Unavailable("injected failure".into()));
            }
            let all: Vec<Value> = s
                .documents
                .iter()
                .filter(|((p, _), _)| *p == path)
                .filter_map(|(_, d)| d.payload.clone())
                .collect();
            let offset: usize =
                request.page_token.as_deref().and_then(|t| t.parse().ok()).unwrap_or(0);
            let limit = request.limit.unwrap_or(usize::MAX);
            let items: Vec<Value> = all.iter().skip(offset).take(limit).cloned().collect();
            let next = offset + items.len();
            let has_more = next < all.len();
            Ok(QueryPage {
                items,
                has_more,
                next_page_token: has_more.then(|| next.to_string()),
                total_count: Some(all.len() as u64),
            })
        })
    }

    fn subscribe(
        &self,
        resource_path: &str,
        _filters: Vec<Filter>,
    ) -> BoxFuture<'_, RemoteResult<UpdateStream>> {
        let path = resource_path.to_string();
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut s = lock(&state);
            if s.fail_subscribes {
                return Err(RemoteError::Rejected("injected failure".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            s.subscribers.push((path, tx));
            let stream = futures_util::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|update| (update, rx))
            });
            Ok(Box::pin(stream) as UpdateStream)
        })
    }
}

/// Yields until `done` holds, giving spawned tasks a chance to run.
pub(crate) async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
