// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use harbor_core::{OfflineOperation, OpId, OpKind, Priority};
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::{Error, Result};

use super::{timestamp, Store};

/// Queues a mutation and mirrors it into the cache.
pub fn write(
    store: &Store,
    resource_path: &str,
    document_id: &str,
    kind: OpKind,
    payload: Value,
    priority: Priority,
) -> Result<OpId> {
    let op =
        OfflineOperation::new(store.ids.now(), resource_path, document_id, kind, payload, priority);
    store.queue.enqueue(&op)?;
    harbor_engine::apply_optimistic(&store.cache, &op)?;
    Ok(op.id)
}

pub fn run_write(
    store: &Store,
    resource_path: &str,
    document_id: &str,
    kind: OpKind,
    payload: Option<&str>,
    priority: Priority,
    out: &mut dyn Write,
) -> Result<()> {
    let payload = match payload {
        Some(text) => serde_json::from_str(text).map_err(Error::InvalidPayload)?,
        None => Value::Null,
    };
    let id = write(store, resource_path, document_id, kind, payload, priority)?;
    writeln!(out, "{id}")?;
    Ok(())
}

fn op_line(op: &OfflineOperation) -> String {
    format!(
        "{}  {}  {}  {}  {}",
        op.id,
        op.priority,
        op.kind,
        op.document_key(),
        timestamp(op.enqueued_at)
    )
}

pub fn list(store: &Store, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let pending = store.queue.pending()?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&pending)?)?,
        OutputFormat::Text if pending.is_empty() => writeln!(out, "no pending operations")?,
        OutputFormat::Text => {
            for op in &pending {
                writeln!(out, "{}", op_line(op))?;
            }
        }
    }
    Ok(())
}

pub fn conflicts(
    store: &Store,
    clear: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let records = store.queue.conflicts()?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?,
        OutputFormat::Text if records.is_empty() => writeln!(out, "no conflicts")?,
        OutputFormat::Text => {
            for record in &records {
                writeln!(
                    out,
                    "{}  remote {}  detected {}",
                    op_line(&record.operation),
                    timestamp(record.server_timestamp),
                    timestamp(record.detected_at)
                )?;
            }
        }
    }
    if clear {
        let removed = store.queue.clear_conflicts()?;
        // Keep JSON output parseable.
        if format == OutputFormat::Text {
            writeln!(out, "cleared {removed} conflicts")?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
