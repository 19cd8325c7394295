// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! harbor_cli - maintenance commands for a harbor offline store.
//!
//! The `harbor` binary opens the SQLite store that an application's
//! data layer writes to and lets an operator inspect and tidy it without
//! a network connection: cache statistics and entries, TTL sweeps, the
//! pending operation queue in replay order, and the conflict log.
//!
//! ```rust,ignore
//! use clap::Parser;
//! let cli = harbor_cli::Cli::parse_from(["harbor", "--db", "/tmp/h.db", "stats"]);
//! harbor_cli::run(cli)?;
//! ```

mod cli;
mod commands;
mod env;

pub mod config;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command, ConfigCommand, OutputArgs, OutputFormat};
pub use error::{Error, Result};

use std::io::{self, Write};

use crate::commands::{cache, queue, Store};

/// Execute a CLI command, printing to stdout.
pub fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Execute a CLI command against `out`.
pub fn execute(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let default_config = config::default_config_path();
    let loaded = config::load(cli.config.as_deref(), default_config.as_deref())?;
    let db = cli.db;

    let open_store = || -> Result<Store> {
        let db_path = config::resolve_db_path(db.as_deref())?;
        tracing::debug!(db = %db_path.display(), "opening store");
        Store::open(&db_path, &loaded.config)
    };

    match cli.command {
        Command::Stats(args) => cache::stats(&open_store()?, args.output, out),
        Command::Sweep => cache::sweep(&open_store()?, out),
        Command::Entries(args) => cache::entries(&open_store()?, args.output, out),
        Command::Get { key, output } => cache::get(&open_store()?, &key, output.output, out),
        Command::Put { key, payload, priority, ttl } => {
            cache::put(&open_store()?, &key, &payload, priority.into(), ttl, out)
        }
        Command::Remove { key } => cache::remove(&open_store()?, &key, out),
        Command::Clear => cache::clear(&open_store()?, out),
        Command::Write { resource_path, document_id, kind, payload, priority } => queue::run_write(
            &open_store()?,
            &resource_path,
            &document_id,
            kind.into(),
            payload.as_deref(),
            priority.into(),
            out,
        ),
        Command::Queue(args) => queue::list(&open_store()?, args.output, out),
        Command::Conflicts { clear, output } => {
            queue::conflicts(&open_store()?, clear, output.output, out)
        }
        Command::Config(ConfigCommand::Show) => commands::config::show(&loaded, out),
        Command::Config(ConfigCommand::Path) => {
            let db_path = db.clone().or_else(config::default_db_path);
            commands::config::path(&loaded, db_path.as_deref(), out)
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
