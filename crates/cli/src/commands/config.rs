// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use crate::config::{render, ConfigSource, LoadedConfig};
use crate::error::Result;

pub fn show(loaded: &LoadedConfig, out: &mut dyn Write) -> Result<()> {
    write!(out, "{}", render(&loaded.config)?)?;
    Ok(())
}

/// Prints the config source and the store path.
pub fn path(loaded: &LoadedConfig, db_path: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    match &loaded.source {
        ConfigSource::File(path) => writeln!(out, "config: {}", path.display())?,
        ConfigSource::Defaults => writeln!(out, "config: (defaults)")?,
    }
    match db_path {
        Some(path) => writeln!(out, "store: {}", path.display())?,
        None => writeln!(out, "store: (unset)")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
