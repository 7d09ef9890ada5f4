//! Error types for mbms-core

use thiserror::Error;

/// Top-level error type for mbms-core
#[derive(Error, Debug)]
pub enum MbmsError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors returned by the session registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures reported by a remote callback endpoint
///
/// Every variant means the remote can no longer be trusted to receive
/// notifications; the registry treats all of them as unreachable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote object is dead")]
    DeadObject,

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Remote call timed out")]
    Timeout,
}

/// Errors from loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
