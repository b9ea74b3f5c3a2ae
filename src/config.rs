//! Configuration System
//!
//! Layered configuration for the `evolimo-compile` / `evolimo-step` binaries,
//! loaded from:
//! - `evolimo.toml` (default configuration)
//! - `evolimo.local.toml` (git-ignored local overrides)
//! - Environment variables (`EVOLIMO_` prefix)
//!
//! This configures tooling only -- nothing here changes IR semantics, which
//! are fixed once a definition is compiled.
//!
//! ## Example
//!
//! ```toml
//! # evolimo.toml
//! definitions_dir = "definitions"
//! output_dir = "_gen"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level compiler/runtime tooling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Directory the compiler scans for definition modules.
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: PathBuf,

    /// Directory the compiler writes `<name>/ir.json` and `<name>/visual.json` into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Prefix used for compiler-generated temporaries (`temp_<k>`).
    #[serde(default = "default_temp_var_prefix")]
    pub temp_var_prefix: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration, mirrored after the lineage's `tracing-subscriber` setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_definitions_dir() -> PathBuf {
    PathBuf::from("definitions")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("_gen")
}

fn default_temp_var_prefix() -> String {
    "temp_".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            definitions_dir: default_definitions_dir(),
            output_dir: default_output_dir(),
            temp_var_prefix: default_temp_var_prefix(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from `evolimo.toml`, `evolimo.local.toml`, then
    /// `EVOLIMO_*` environment variables, each layer overriding the last.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(
            CompilerConfig::default(),
        ))
        .merge(Toml::file("evolimo.toml"))
        .merge(Toml::file("evolimo.local.toml"))
        .merge(Env::prefixed("EVOLIMO_").split("__"))
        .extract()
    }
}

/// Initialize the global `tracing` subscriber from a [`LoggingConfig`].
pub fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if config.format == "json" {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = CompilerConfig::default();
        assert_eq!(config.definitions_dir, PathBuf::from("definitions"));
        assert_eq!(config.output_dir, PathBuf::from("_gen"));
        assert_eq!(config.logging.level, "info");
    }
}
