// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use harbor_core::{OpKind, Priority};

use crate::env::vars;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Critical,
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Critical => Priority::Critical,
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Create,
    Update,
    Delete,
}

impl From<KindArg> for OpKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Create => OpKind::Create,
            KindArg::Update => OpKind::Update,
            KindArg::Delete => OpKind::Delete,
        }
    }
}

const QUICKSTART_HELP: &str = "\
Examples:
  harbor put patient:42 '{\"name\": \"Ada\"}' --priority high
  harbor get patient:42
  harbor write visits v1 create '{\"clinic\": \"north\"}'
  harbor queue
  harbor stats -o json";

#[derive(Parser, Debug)]
#[command(name = "harbor", version)]
#[command(about = "Inspect and maintain a harbor offline store")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Path to the SQLite store (default: platform data dir)
    #[arg(long, global = true, env = vars::HARBOR_DB)]
    pub db: Option<PathBuf>,

    /// Path to harbor.toml (default: platform config dir)
    #[arg(long, global = true, env = vars::HARBOR_CONFIG)]
    pub config: Option<PathBuf>,

    /// Log more detail to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show cache entry counts by priority
    Stats(OutputArgs),

    /// Remove expired cache entries
    Sweep,

    /// List live cache entries
    Entries(OutputArgs),

    /// Print a cached value
    Get {
        key: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Cache a JSON value
    Put {
        key: String,
        /// JSON payload
        payload: String,
        #[arg(short, long, value_enum, default_value = "medium")]
        priority: PriorityArg,
        /// Retention in seconds (default: the priority's TTL)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Remove a cached value
    Remove { key: String },

    /// Remove every cache entry
    Clear,

    /// Queue a mutation and apply it to the cache
    Write {
        resource_path: String,
        document_id: String,
        #[arg(value_enum)]
        kind: KindArg,
        /// JSON payload (required for create and update)
        payload: Option<String>,
        #[arg(short, long, value_enum, default_value = "medium")]
        priority: PriorityArg,
    },

    /// List queued operations in replay order
    Queue(OutputArgs),

    /// Show or clear the conflict log
    Conflicts {
        /// Empty the log after printing it
        #[arg(long)]
        clear: bool,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print where configuration is read from
    Path,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
