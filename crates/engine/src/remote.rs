// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Abstraction over the remote document store.
//!
//! The data layer has no wire format of its own. It talks to the remote
//! store through [`RemoteStore`], which production code implements over
//! whatever SDK or protocol the store speaks and tests implement in memory.

use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

use harbor_core::{OfflineOperation, OpId, OpKind};

/// Boxed future returned by [`RemoteStore`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Stream of pushed updates for a subscription.
pub type UpdateStream = Pin<Box<dyn Stream<Item = RemoteUpdate> + Send>>;

/// Error type for remote calls.
///
/// Every variant is treated as transient by the sync engine. Conflicts are
/// not errors; they come back as [`ApplyOutcome::Conflict`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote call timed out")]
    Timeout,

    #[error("remote rejected request: {0}")]
    Rejected(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A queued mutation as sent to the remote store.
///
/// `op_id` is the idempotency key: applying the same id twice must leave the
/// remote in the same state as applying it once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub op_id: OpId,
    pub resource_path: String,
    pub document_id: String,
    pub kind: OpKind,
    pub payload: Value,
    /// When the local mutation was made; a newer remote copy wins.
    pub base_timestamp: DateTime<Utc>,
}

impl From<&OfflineOperation> for ApplyRequest {
    fn from(op: &OfflineOperation) -> Self {
        ApplyRequest {
            op_id: op.id,
            resource_path: op.resource_path.clone(),
            document_id: op.document_id.clone(),
            kind: op.kind,
            payload: op.payload.clone(),
            base_timestamp: op.enqueued_at,
        }
    }
}

/// Result of a successful remote apply call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The remote document was modified at `server_timestamp`, after the
    /// mutation's base timestamp; the mutation was not applied.
    Conflict { server_timestamp: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Filter { field: field.into(), op, value }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

/// A page request against one resource path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order = Some(OrderBy { field: field.into(), descending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    pub items: Vec<Value>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// A change pushed by the remote store to a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteUpdate {
    Upserted { document_id: String, payload: Value, server_timestamp: DateTime<Utc> },
    Removed { document_id: String, server_timestamp: DateTime<Utc> },
}

/// The remote document store.
///
/// Methods return boxed futures so the trait stays object safe; the data
/// layer holds an `Arc<dyn RemoteStore>`.
pub trait RemoteStore: Send + Sync {
    /// Applies one queued mutation. Must be idempotent per `op_id`.
    fn apply(&self, request: ApplyRequest) -> BoxFuture<'_, RemoteResult<ApplyOutcome>>;

    /// Fetches one page of documents.
    fn query(
        &self,
        resource_path: &str,
        request: QueryRequest,
    ) -> BoxFuture<'_, RemoteResult<QueryPage>>;

    /// Opens a long-lived subscription.
    fn subscribe(
        &self,
        resource_path: &str,
        filters: Vec<Filter>,
    ) -> BoxFuture<'_, RemoteResult<UpdateStream>>;
}
