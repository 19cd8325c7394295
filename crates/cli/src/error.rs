// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the `harbor` command.
///
/// Messages are shown to the user as-is, so several carry a hint.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] harbor_core::Error),

    #[error(transparent)]
    Engine(#[from] harbor_engine::Error),

    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: std::io::Error },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse { path: PathBuf, source: toml::de::Error },

    #[error("cannot render config: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    #[error("no database path\n  hint: pass --db or set HARBOR_DB")]
    NoDatabasePath,

    #[error("invalid JSON payload: {0}\n  hint: quote the payload, e.g. '{{\"name\": \"Ada\"}}'")]
    InvalidPayload(serde_json::Error),

    #[error("cache entry not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
