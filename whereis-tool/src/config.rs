use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ToolError;

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct StoreConfig {
    /// Fjall database holding the item collection.
    pub path: Option<PathBuf>,
    /// Backups, exports and image assets.
    pub data_dir: Option<PathBuf>,
}

/// Where the store and its files live once flags, config and defaults are merged.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub store: PathBuf,
    pub data_dir: PathBuf,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("whereis").join("config.toml"))
}

fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("whereis")
}

pub fn parse_config(content: &str) -> Result<Config, ToolError> {
    Ok(toml::from_str(content)?)
}

/// Reads `~/.config/whereis/config.toml`; a missing file yields defaults.
pub fn load_config() -> Result<Config, ToolError> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(err) => Err(err.into()),
    }
}

/// Command-line flags win over the config file, which wins over defaults.
pub fn resolve_paths(
    config: Config,
    cli_store: Option<PathBuf>,
    cli_data_dir: Option<PathBuf>,
) -> ResolvedPaths {
    let root = default_root();

    ResolvedPaths {
        store: cli_store
            .or(config.store.path)
            .unwrap_or_else(|| root.join("store")),
        data_dir: cli_data_dir
            .or(config.store.data_dir)
            .unwrap_or_else(|| root.join("data")),
    }
}
