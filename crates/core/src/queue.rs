// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of mutations awaiting remote application.
//!
//! Operations are persisted the moment they are enqueued and removed only
//! once the remote store has confirmed them ([`OperationQueue::acknowledge`])
//! or they have lost a conflict ([`OperationQueue::abandon`]).

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::op::{replay_order, ConflictRecord, OfflineOperation, OpId};
use crate::store::QueueBackend;

pub struct OperationQueue {
    backend: Arc<dyn QueueBackend>,
}

impl OperationQueue {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        OperationQueue { backend }
    }

    /// Validates and persists an operation.
    ///
    /// Validation failures are returned to the caller and nothing is queued.
    pub fn enqueue(&self, op: &OfflineOperation) -> Result<()> {
        op.validate()?;
        self.backend.insert_operation(op)?;
        tracing::debug!(
            id = %op.id,
            document = %op.document_key(),
            kind = %op.kind,
            "enqueued operation"
        );
        Ok(())
    }

    /// Returns every queued operation in replay order.
    pub fn pending(&self) -> Result<Vec<OfflineOperation>> {
        Ok(replay_order(self.backend.scan_operations()?))
    }

    pub fn len(&self) -> Result<usize> {
        self.backend.count_operations()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes an operation the remote store has applied.
    pub fn acknowledge(&self, id: &OpId) -> Result<()> {
        if !self.backend.remove_operation(id)? {
            // Already gone: a replay after a crash can confirm twice.
            tracing::debug!(%id, "acknowledged operation was not queued");
        }
        Ok(())
    }

    /// Drops an operation that lost to a newer remote copy and logs the conflict.
    pub fn abandon(
        &self,
        op: &OfflineOperation,
        server_timestamp: DateTime<Utc>,
        detected_at: DateTime<Utc>,
    ) -> Result<ConflictRecord> {
        let record = ConflictRecord { operation: op.clone(), server_timestamp, detected_at };
        if !self.backend.abandon_operation(&record)? {
            return Err(Error::OperationNotFound(op.id.to_string()));
        }
        tracing::warn!(
            id = %op.id,
            document = %op.document_key(),
            enqueued_at = %op.enqueued_at,
            %server_timestamp,
            "operation abandoned: remote copy is newer"
        );
        Ok(record)
    }

    /// The conflict log, oldest first.
    pub fn conflicts(&self) -> Result<Vec<ConflictRecord>> {
        self.backend.scan_conflicts()
    }

    pub fn clear_conflicts(&self) -> Result<usize> {
        self.backend.clear_conflicts()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
