// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and loading `harbor.toml` and the store.
//!
//! An explicit `--config` path (or `HARBOR_CONFIG`) must exist. Without
//! one, the platform config dir is checked and defaults apply when no file
//! is there.

use std::fs;
use std::path::{Path, PathBuf};

use harbor_engine::Config;

use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "harbor";
const CONFIG_FILE_NAME: &str = "harbor.toml";
const DB_FILE_NAME: &str = "harbor.db";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// The platform default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// The platform default store location.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(DB_FILE_NAME))
}

/// Parses and validates configuration text.
pub fn parse(text: &str, path: &Path) -> Result<Config> {
    let config: Config = toml::from_str(text)
        .map_err(|source| Error::ConfigParse { path: path.to_path_buf(), source })?;
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .map_err(|source| Error::ConfigRead { path: path.to_path_buf(), source })?;
    parse(&text, path)
}

/// Loads the configuration from `explicit`, else from `fallback` if that
/// file exists, else defaults.
pub fn load(explicit: Option<&Path>, fallback: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading config");
        return Ok(LoadedConfig { config: read(path)?, source: ConfigSource::File(path.into()) });
    }
    match fallback {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "loading default config");
            Ok(LoadedConfig { config: read(path)?, source: ConfigSource::File(path.into()) })
        }
        _ => Ok(LoadedConfig { config: Config::default(), source: ConfigSource::Defaults }),
    }
}

/// Resolves the store path, creating its parent directory.
pub fn resolve_db_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_db_path().ok_or(Error::NoDatabasePath)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(path)
}

/// Renders configuration as TOML.
pub fn render(config: &Config) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
