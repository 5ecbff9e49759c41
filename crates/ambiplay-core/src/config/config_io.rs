//! Configuration loading and path resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::config_runtime::{apply_idle_defaults, normalize_player_filters};
use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFailed(String),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("missing $HOME, unable to resolve config directory")]
    MissingHome,
}

impl Config {
    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::ReadFailed(err.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration text and apply runtime defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(contents).map_err(|err| ConfigError::ParseFailed(err.to_string()))?;
        config.apply_runtime_defaults();
        Ok(config)
    }

    /// Load configuration from the default XDG config location, if present.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            let mut config = Self::default();
            config.apply_runtime_defaults();
            return Ok(config);
        }
        Self::load_from_path(&path)
    }

    fn apply_runtime_defaults(&mut self) {
        apply_idle_defaults(&mut self.idle);
        normalize_player_filters(&mut self.sessions);
    }

    /// Return the default config directory based on XDG or $HOME.
    pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return Ok(PathBuf::from(xdg).join("ambiplay"));
            }
        }
        let home = env::var("HOME").map_err(|_| ConfigError::MissingHome)?;
        Ok(PathBuf::from(home).join(".config").join("ambiplay"))
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }
}
