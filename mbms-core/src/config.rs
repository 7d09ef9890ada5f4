//! Registry configuration types

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default label used in log records
pub const DEFAULT_REGISTRY_NAME: &str = "callbacks";

/// Default capacity of the registry event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration for a [`SessionRegistry`](crate::session::SessionRegistry)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryConfig {
    /// Name attached to every log record from this registry
    #[serde(default = "default_name")]
    pub name: String,

    /// Capacity of the broadcast channel carrying registry events
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_name() -> String {
    DEFAULT_REGISTRY_NAME.to_string()
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl RegistryConfig {
    /// Create a config with the given name and default capacity
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a config from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        // tokio's broadcast channel panics on zero capacity
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
