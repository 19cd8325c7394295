// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the `harbor` command.
//!
//! The name constants are generated by `build.rs` and live in [`vars`].
//! `HARBOR_DB` and `HARBOR_CONFIG` are read by clap as fallbacks for
//! `--db` and `--config`.

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// The tracing filter directive from `HARBOR_LOG`, if set and non-empty.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::HARBOR_LOG).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
