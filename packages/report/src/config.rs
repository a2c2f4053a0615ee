use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StoreAppConfig;

/// Where callers stage files before linking them into a report.
#[derive(Debug, Deserialize, Clone)]
pub struct ScratchConfig {
    /// Base for relative file paths. Default: "./scratch".
    #[serde(default = "default_scratch_dir")]
    pub dir: PathBuf,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("./scratch")
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: default_scratch_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportAppConfig {
    #[serde(default)]
    pub scratch: ScratchConfig,
    #[serde(default)]
    pub store: StoreAppConfig,
}

impl ReportAppConfig {
    /// Load from `config/config.toml` (or `$REPORT_CONFIG`), then
    /// `REPORT__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("REPORT_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("REPORT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
