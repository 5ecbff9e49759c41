//! Configuration module wiring for ambiplay.
//!
//! Keeps config types, I/O, and runtime defaults in separate files.

mod config_io;
mod config_runtime;
mod config_types;

pub use config_io::ConfigError;
pub use config_types::*;
