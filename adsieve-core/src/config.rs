//! TOML configuration for storage keys, migration placeholders and
//! settings defaults. Every field is optional in the file.

use crate::{ConfigError, Settings};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STATE_DIR_ENV: &str = "ADSIEVE_STATE_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    pub storage: StorageConfig,
    pub migration: MigrationConfig,
    pub defaults: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the file backend; `None` keeps state in memory.
    pub directory: Option<PathBuf>,
    pub hidden_key: String,
    pub contacted_key: String,
    pub keywords_key: String,
    pub settings_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            hidden_key: "ka_hidden_ads_v3".to_string(),
            contacted_key: "ka_contacted_ads".to_string(),
            keywords_key: "ka_hidden_keywords".to_string(),
            settings_key: "ka_settings".to_string(),
        }
    }
}

/// Values written into records upgraded from bare ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub unknown_title: String,
    pub unknown_category: String,
    pub unknown_url: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            unknown_title: "(unknown)".to_string(),
            unknown_category: "unknown".to_string(),
            unknown_url: "#".to_string(),
        }
    }
}

impl CuratorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: CuratorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!(?path, "loading curator config");
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFormat {
            details: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&source)
    }

    /// Replace the storage directory from `ADSIEVE_STATE_DIR` when it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            let dir = dir.trim();
            if !dir.is_empty() {
                self.storage.directory = Some(PathBuf::from(dir));
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = [
            &self.storage.hidden_key,
            &self.storage.contacted_key,
            &self.storage.keywords_key,
            &self.storage.settings_key,
        ];

        if keys.iter().any(|key| key.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed {
                reason: "storage keys must not be empty".to_string(),
            });
        }

        // Keys double as file names for the file backend
        if let Some(key) = keys
            .iter()
            .find(|key| key.contains(['/', '\\']) || key.contains(".."))
        {
            return Err(ConfigError::ValidationFailed {
                reason: format!("storage key {:?} must be a plain file name", key),
            });
        }

        let distinct: HashSet<&str> = keys.iter().map(|key| key.as_str()).collect();
        if distinct.len() != keys.len() {
            return Err(ConfigError::ValidationFailed {
                reason: "storage keys must be distinct".to_string(),
            });
        }

        Ok(())
    }
}
