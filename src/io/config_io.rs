use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Settings;

/// Name of the settings file looked up at the vault root
pub const SETTINGS_FILE: &str = ".tally.toml";

/// Error type for reading settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings for a vault: `<vault>/.tally.toml`, or defaults.
pub fn find_settings(vault: &Path) -> Result<Settings, ConfigError> {
    load_settings(&vault.join(SETTINGS_FILE))
}
