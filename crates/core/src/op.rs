// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued offline mutations.
//!
//! Every write made through the data layer becomes an [`OfflineOperation`]
//! that waits in the durable queue until the remote store confirms it. The
//! operation id doubles as the idempotency key for the remote apply, so a
//! crash between "applied" and "dequeued" only costs a harmless replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::hlc::Hlc;
use crate::priority::Priority;

/// Unique identifier for an operation.
pub type OpId = Hlc;

/// The kind of mutation carried by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(OpKind::Create),
            "update" => Ok(OpKind::Update),
            "delete" => Ok(OpKind::Delete),
            _ => Err(Error::InvalidOpKind(s.to_string())),
        }
    }
}

/// A mutation waiting to be applied to the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfflineOperation {
    pub id: OpId,
    pub resource_path: String,
    pub document_id: String,
    pub kind: OpKind,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    pub priority: Priority,
}

impl OfflineOperation {
    /// Creates an operation stamped with its id's wall time.
    pub fn new(
        id: OpId,
        resource_path: impl Into<String>,
        document_id: impl Into<String>,
        kind: OpKind,
        payload: Value,
        priority: Priority,
    ) -> Self {
        OfflineOperation {
            id,
            resource_path: resource_path.into(),
            document_id: document_id.into(),
            kind,
            payload,
            enqueued_at: id.wall_time(),
            priority,
        }
    }

    /// Identity of the target document; ordering is preserved per key.
    pub fn document_key(&self) -> DocumentKey<'_> {
        DocumentKey { resource_path: &self.resource_path, document_id: &self.document_id }
    }

    /// Checks structural preconditions before the operation may be queued.
    pub fn validate(&self) -> Result<()> {
        if self.resource_path.trim().is_empty() {
            return Err(Error::Validation("resource path is empty".into()));
        }
        if self.resource_path.contains(char::is_whitespace) {
            return Err(Error::Validation(format!(
                "resource path '{}' contains whitespace",
                self.resource_path
            )));
        }
        if self.document_id.trim().is_empty() {
            return Err(Error::Validation("document id is empty".into()));
        }
        match self.kind {
            OpKind::Create | OpKind::Update if !self.payload.is_object() => {
                Err(Error::Validation(format!(
                    "{} of {}/{} requires an object payload",
                    self.kind, self.resource_path, self.document_id
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Borrowed `(resource_path, document_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentKey<'a> {
    pub resource_path: &'a str,
    pub document_id: &'a str,
}

impl fmt::Display for DocumentKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_path, self.document_id)
    }
}

/// An operation abandoned because the remote copy was newer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictRecord {
    pub operation: OfflineOperation,
    /// Last-modified time of the remote document that won.
    pub server_timestamp: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
}

/// Orders operations for replay.
///
/// Operations are sorted by priority, then enqueue time, then id. Each
/// operation inherits the highest priority of any later operation on the same
/// document, so a critical delete never overtakes the low-priority create it
/// depends on.
pub fn replay_order(mut ops: Vec<OfflineOperation>) -> Vec<OfflineOperation> {
    ops.sort_by(|a, b| a.enqueued_at.cmp(&b.enqueued_at).then_with(|| a.id.cmp(&b.id)));

    // Walk newest to oldest, carrying the max priority seen per document.
    let effective = {
        let mut effective = vec![Priority::Low; ops.len()];
        let mut carried: HashMap<DocumentKey<'_>, Priority> = HashMap::new();
        for (idx, op) in ops.iter().enumerate().rev() {
            let entry = carried.entry(op.document_key()).or_insert(op.priority);
            if op.priority > *entry {
                *entry = op.priority;
            }
            effective[idx] = *entry;
        }
        effective
    };

    let mut indexed: Vec<(Priority, usize)> = effective.into_iter().zip(0..).collect();
    // Stable sort keeps enqueue order within a tier.
    indexed.sort_by_key(|(priority, _)| priority.rank());

    let mut slots: Vec<Option<OfflineOperation>> = ops.into_iter().map(Some).collect();
    indexed.into_iter().filter_map(|(_, idx)| slots[idx].take()).collect()
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
