// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{ExchangeError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, prefix `HTTPDUMP_`, `__` between
    ///    section and key, e.g. `HTTPDUMP_RETRY__LIMIT=3`)
    /// 2. Config file (`path`, or `~/.httpdump/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // An explicit path must exist; the default one is optional
            .add_source(File::from(file).required(path.is_some()))
            .add_source(
                Environment::with_prefix("HTTPDUMP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("masker.query_params")
                    .with_list_parse_key("masker.json_fields")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ExchangeError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ExchangeError::Config(e.to_string()))
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".httpdump")
            .join("config.toml")
    }
}
