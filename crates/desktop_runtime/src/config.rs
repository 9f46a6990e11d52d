//! Workspace configuration: storage keys, boot behavior, and the first-boot app catalog.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AppRegistration;

/// Default key of the persisted items record.
pub const DEFAULT_ITEMS_KEY: &str = "items";
/// Default key of the persisted windows record.
pub const DEFAULT_WINDOWS_KEY: &str = "windows";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse workspace config: {0}")]
    Parse(String),
    #[error("invalid workspace config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub items_key: String,
    pub windows_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            items_key: DEFAULT_ITEMS_KEY.to_string(),
            windows_key: DEFAULT_WINDOWS_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reopen the windows that were open when the previous session ended.
    pub restore_windows_on_boot: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            restore_windows_on_boot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub storage: StorageConfig,
    pub session: SessionConfig,
    /// Apps registered (ready) when no items record exists yet.
    pub seed_apps: Vec<AppRegistration>,
}

impl WorkspaceConfig {
    /// Parses and validates a TOML document. Missing sections take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] when
    /// [`WorkspaceConfig::validate`] rejects the result.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for empty or shared storage keys and repeated seed ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let storage = &self.storage;
        if storage.items_key.trim().is_empty() || storage.windows_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage keys must not be empty".to_string(),
            ));
        }
        if storage.items_key == storage.windows_key {
            return Err(ConfigError::Invalid(format!(
                "items and windows share the storage key `{}`",
                storage.items_key
            )));
        }

        let mut seen = HashSet::new();
        for app in &self.seed_apps {
            if !seen.insert(&app.id) {
                return Err(ConfigError::Invalid(format!(
                    "seed app `{}` is listed twice",
                    app.id
                )));
            }
        }
        Ok(())
    }
}
