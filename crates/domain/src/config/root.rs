use serde::{Deserialize, Serialize};

use super::engine::EngineConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::storage::StorageConfig;
use super::updates::UpdatesConfig;

const LOCAL_CONFIG_PATH: &str = "ferrous-filters.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-filters/config.toml";

/// Main configuration structure for Ferrous Filters
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Change batching
    #[serde(default)]
    pub engine: EngineConfig,

    /// Update checks and remote endpoints
    #[serde(default)]
    pub updates: UpdatesConfig,

    /// Database, rule files and catalog locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-filters.toml in current directory
    /// 3. /etc/ferrous-filters/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(db) = overrides.database_path {
            self.storage.database_path = db;
        }
        if let Some(dir) = overrides.rules_dir {
            self.storage.rules_dir = dir;
        }
        if let Some(catalog) = overrides.catalog_path {
            self.storage.catalog_path = catalog;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "engine.debounce_ms must be greater than 0".to_string(),
            ));
        }

        let url = &self.updates.filters_url;
        if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with("file://")
        {
            return Err(ConfigError::Validation(format!(
                "updates.filters_url '{}' must be an http(s) or file url",
                url
            )));
        }

        if self.updates.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "updates.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub database_path: Option<String>,
    pub rules_dir: Option<String>,
    pub catalog_path: Option<String>,
    pub log_level: Option<String>,
}
