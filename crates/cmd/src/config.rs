// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::ValueEnum;
use loader::DatasetConfig;
use partstore::{HostStore, LocalStore, MemoryStore, NoStore};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming the local part cache directory.
pub const CACHE_ENV: &str = "SHARDSQL_CACHE";

/// Cache directory used when neither the flag nor the environment sets one.
pub const DEFAULT_CACHE_DIR: &str = ".shardsql/cache";

/// Load a dataset configuration from a YAML file
///
/// Fields missing from the file keep their deployment defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DatasetConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
    parse_config(&content)
}

/// Parse and validate a YAML dataset configuration
pub fn parse_config(content: &str) -> Result<DatasetConfig> {
    let config: DatasetConfig =
        serde_yaml_ng::from_str(content).with_context(|| "Failed to parse YAML configuration")?;
    _ = config.layout()?;
    Ok(config)
}

/// The configuration in effect: the file when one is given, the defaults
/// otherwise, then the command-line base URL override.
pub fn resolve_config(path: Option<&Path>, base_url: Option<&str>) -> Result<DatasetConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(url) = base_url {
        config.base_url = url.to_string();
        _ = config.layout()?;
    }
    Ok(config)
}

/// `--cache-dir` wins, then `SHARDSQL_CACHE`, then the default.
#[must_use]
pub fn resolve_cache_dir(flag: Option<PathBuf>) -> PathBuf {
    cache_dir_from(flag, std::env::var_os(CACHE_ENV))
}

fn cache_dir_from(flag: Option<PathBuf>, env: Option<OsString>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}

/// Where fetched parts are kept between sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CacheMode {
    /// Files in the cache directory
    #[default]
    Host,
    /// Process memory, gone when the command exits
    Memory,
    /// No cache; every part comes from the network
    None,
}

/// Open the part store for `mode`. `cache_dir` only applies to
/// [`CacheMode::Host`].
pub async fn open_store(mode: CacheMode, cache_dir: Option<PathBuf>) -> Arc<dyn LocalStore> {
    match mode {
        CacheMode::Host => Arc::new(HostStore::open(resolve_cache_dir(cache_dir)).await),
        CacheMode::Memory => Arc::new(MemoryStore::new()),
        CacheMode::None => Arc::new(NoStore),
    }
}
