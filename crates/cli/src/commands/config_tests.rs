// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use harbor_engine::Config;

use super::*;
use crate::commands::testing::capture;

fn defaults() -> LoadedConfig {
    LoadedConfig { config: Config::default(), source: ConfigSource::Defaults }
}

#[test]
fn show_renders_parseable_toml() {
    let printed = capture(|out| show(&defaults(), out));
    let reparsed: Config = toml::from_str(&printed).unwrap();
    assert_eq!(reparsed, Config::default());
    assert!(printed.contains("[cache]"));
    assert!(printed.contains("max_connections = 10"));
}

#[test]
fn path_reports_defaults_and_store() {
    let printed = capture(|out| path(&defaults(), Some(&PathBuf::from("/tmp/h.db")), out));
    assert_eq!(printed, "config: (defaults)\nstore: /tmp/h.db\n");
}

#[test]
fn path_reports_config_file() {
    let loaded = LoadedConfig {
        config: Config::default(),
        source: ConfigSource::File(PathBuf::from("/etc/harbor.toml")),
    };
    let printed = capture(|out| path(&loaded, None, out));
    assert_eq!(printed, "config: /etc/harbor.toml\nstore: (unset)\n");
}
