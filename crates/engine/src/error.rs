// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for harbor-engine operations.

use std::time::Duration;
use thiserror::Error;

use crate::pool::PoolKind;
use crate::remote::RemoteError;

/// Errors surfaced to callers of the data layer.
///
/// Transient remote failures met while draining the queue never appear here:
/// the sync engine absorbs them and reports through its status instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] harbor_core::Error),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("timed out after {waited:?} waiting for a {kind} slot on '{resource_path}'")]
    PoolTimeout { kind: PoolKind, resource_path: String, waited: Duration },

    #[error("{kind} pool for '{resource_path}' is closed")]
    PoolClosed { kind: PoolKind, resource_path: String },

    #[error("offline and nothing cached for '{0}'")]
    Offline(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for errors caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_validation())
    }
}

/// A specialized Result type for harbor-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
