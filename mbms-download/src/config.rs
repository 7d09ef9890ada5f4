//! Host configuration types

use std::path::Path;

use mbms_core::{ConfigError, RegistryConfig};
use serde::{Deserialize, Serialize};

use crate::types::ResultCode;

/// Configuration for a [`DownloadServiceHost`](crate::DownloadServiceHost)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Registry holding one manager callback per (client, subscription)
    #[serde(default = "default_manager_registry")]
    pub manager_registry: RegistryConfig,

    /// Registry holding one progress callback per download request
    #[serde(default = "default_download_registry")]
    pub download_registry: RegistryConfig,

    /// Code returned by `initialize` when the client cannot be set up
    #[serde(default = "default_initialize_failure_code")]
    pub initialize_failure_code: ResultCode,
}

fn default_manager_registry() -> RegistryConfig {
    RegistryConfig::named("download-manager")
}

fn default_download_registry() -> RegistryConfig {
    RegistryConfig::named("download-state")
}

fn default_initialize_failure_code() -> ResultCode {
    ResultCode::UnableToInitialize
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            manager_registry: default_manager_registry(),
            download_registry: default_download_registry(),
            initialize_failure_code: default_initialize_failure_code(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a config from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.manager_registry.validate()?;
        config.download_registry.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
