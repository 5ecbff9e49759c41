//! Configuration types and defaults for ambiplay.

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sessions: SessionsConfig,
    pub idle: IdleConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SessionsConfig {
    /// Initial state of the session access grant.
    pub access_granted: bool,
    /// Include web browser media players.
    pub include_browsers: bool,
    /// Allowlist of player bus names (case-insensitive substrings).
    pub allowlist: Vec<String>,
    /// Denylist of player bus names (case-insensitive substrings).
    pub denylist: Vec<String>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            access_granted: true,
            include_browsers: true,
            allowlist: Vec::new(),
            denylist: vec!["playerctld".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct IdleConfig {
    pub tick_interval_ms: u64,
    pub dim_after_ms: u64,
    pub terminate_after_ms: u64,
    /// Overlay opacity the renderer eases toward while dimmed.
    pub dim_opacity: f64,
    /// Exit the daemon once the display terminates.
    pub exit_on_terminate: bool,
}

impl IdleConfig {
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
            dim_after_ms: 7_000,
            terminate_after_ms: 10_000,
            dim_opacity: 0.8,
            exit_on_terminate: true,
        }
    }
}
