//! Download domain types shared between the host and vendor services

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription (SIM) the client is operating under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub i32);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single file offered by a file service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub uri: String,
    pub mime_type: String,
}

/// A broadcast service carrying files the client may download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileServiceInfo {
    pub service_id: String,
    pub name: String,
    /// Opaque class string negotiated between the app and the carrier
    pub service_class: String,
    pub files: Vec<FileInfo>,
}

/// A request to download a set of files from a file service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub id: Uuid,
    pub subscription_id: SubscriptionId,
    pub source_uri: String,
    pub destination: PathBuf,
}

impl DownloadRequest {
    pub fn new(
        subscription_id: SubscriptionId,
        source_uri: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            source_uri: source_uri.into(),
            destination: destination.into(),
        }
    }

    /// Registry key for this request's progress callback
    pub fn key(&self) -> DownloadKey {
        DownloadKey {
            subscription_id: self.subscription_id,
            download_id: self.id,
        }
    }
}

/// Registry key of a download progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadKey {
    pub subscription_id: SubscriptionId,
    pub download_id: Uuid,
}

/// Status of a file within a download request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// No record of the file, or the middleware is not initialized
    #[default]
    Unknown,
    ActivelyDownloading,
    PendingDownload,
    PendingRepair,
    PendingDownloadWindow,
}

impl DownloadStatus {
    /// Stable integer used on the wire
    pub fn code(&self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::ActivelyDownloading => 1,
            Self::PendingDownload => 2,
            Self::PendingRepair => 3,
            Self::PendingDownloadWindow => 4,
        }
    }
}

/// Result codes returned to the client
///
/// Serialized as the stable integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ResultCode {
    Success,
    MiddlewareNotBound,
    UnableToInitialize,
    MiddlewareNotYetReady,
    CannotChangeTempFileRoot,
    UnknownDownloadRequest,
}

impl ResultCode {
    /// Stable integer used on the wire
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::MiddlewareNotBound => 3,
            Self::UnableToInitialize => 103,
            Self::MiddlewareNotYetReady => 201,
            Self::CannotChangeTempFileRoot => 401,
            Self::UnknownDownloadRequest => 402,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl TryFrom<i32> for ResultCode {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Success),
            3 => Ok(Self::MiddlewareNotBound),
            103 => Ok(Self::UnableToInitialize),
            201 => Ok(Self::MiddlewareNotYetReady),
            401 => Ok(Self::CannotChangeTempFileRoot),
            402 => Ok(Self::UnknownDownloadRequest),
            other => Err(format!("unknown result code {}", other)),
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.code()
    }
}
