// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::time::Duration;

use harbor_core::{CacheEntry, Priority};

use crate::cli::OutputFormat;
use crate::error::{Error, Result};

use super::{timestamp, Store};

pub fn stats(store: &Store, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let stats = store.cache.stats()?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?,
        OutputFormat::Text => {
            writeln!(out, "total: {}", stats.total_entries)?;
            for priority in Priority::ALL {
                let count = stats.entries_by_priority.get(&priority).copied().unwrap_or(0);
                writeln!(out, "{priority}: {count}")?;
            }
        }
    }
    Ok(())
}

pub fn sweep(store: &Store, out: &mut dyn Write) -> Result<()> {
    let removed = store.cache.clear_expired()?;
    writeln!(out, "removed {removed} expired entries")?;
    Ok(())
}

pub fn entries(store: &Store, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let entries = store.cache.live_entries()?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?,
        OutputFormat::Text => {
            for entry in &entries {
                writeln!(out, "{}", entry_line(entry))?;
            }
        }
    }
    Ok(())
}

fn entry_line(entry: &CacheEntry) -> String {
    format!("{}  {}  expires {}", entry.key, entry.priority, timestamp(entry.expires_at))
}

pub fn get(store: &Store, key: &str, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let entry = store.cache.retrieve_entry(key)?.ok_or_else(|| Error::NotFound(key.to_string()))?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&entry)?)?,
        OutputFormat::Text => writeln!(out, "{}", serde_json::to_string_pretty(&entry.payload)?)?,
    }
    Ok(())
}

pub fn put(
    store: &Store,
    key: &str,
    payload: &str,
    priority: Priority,
    ttl_secs: Option<u64>,
    out: &mut dyn Write,
) -> Result<()> {
    let payload = serde_json::from_str(payload).map_err(Error::InvalidPayload)?;
    store.cache.store(key, payload, priority, ttl_secs.map(Duration::from_secs))?;
    if let Some(entry) = store.cache.retrieve_entry(key)? {
        writeln!(out, "stored {}", entry_line(&entry))?;
    }
    Ok(())
}

pub fn remove(store: &Store, key: &str, out: &mut dyn Write) -> Result<()> {
    if !store.cache.remove(key)? {
        return Err(Error::NotFound(key.to_string()));
    }
    writeln!(out, "removed {key}")?;
    Ok(())
}

pub fn clear(store: &Store, out: &mut dyn Write) -> Result<()> {
    let removed = store.cache.clear_all()?;
    writeln!(out, "removed {removed} entries")?;
    Ok(())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
