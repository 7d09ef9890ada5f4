//! Error types for mbms-download

use mbms_core::{ConfigError, RegistryError};
use thiserror::Error;

/// Top-level error type for mbms-download
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors a vendor service may raise from any call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),
}
