//! Configuration loading and tracing setup.
//!
//! Keeps environment handling and logging setup out of the main control flow.

use ambiplay_core::Config;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use super::Args;

pub(super) fn load_config(args: &Args) -> Result<Config> {
    match args.config.as_ref() {
        Some(path) => Config::load_from_path(path).context("read config from path"),
        None => Config::load_default().context("read default config"),
    }
}

/// Where the effective configuration came from, for the startup log line.
pub(super) fn config_source(args: &Args) -> &'static str {
    if args.config.is_some() {
        return "custom";
    }
    match Config::default_config_path() {
        Ok(path) if path.exists() => "default",
        _ => "builtin",
    }
}

pub(super) fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            config
                .general
                .log_level
                .clone()
                .unwrap_or_else(|| "info".to_string()),
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
