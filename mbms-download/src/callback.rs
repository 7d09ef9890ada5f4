//! Typed in-process callbacks handed to vendor services
//!
//! Each callback wraps one registration in a [`SessionRegistry`]. Calling
//! it forwards a notification to the client process; if the client is
//! gone, the registry evicts the session and the vendor hears about it
//! through [`DownloadService::on_app_callback_died`](crate::DownloadService::on_app_callback_died)
//! rather than through an error here.

use mbms_core::{DispatchResult, SessionRegistry, SessionToken};
use serde::{Deserialize, Serialize};

use crate::types::{DownloadKey, DownloadRequest, FileInfo, FileServiceInfo, ResultCode, SubscriptionId};

/// Notifications sent to a client's download manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManagerNotification {
    Error { code: i32, message: String },
    FileServicesUpdated { services: Vec<FileServiceInfo> },
    MiddlewareReady,
}

/// Notifications sent to a client about one download request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadStateNotification {
    Progress {
        request: DownloadRequest,
        file: FileInfo,
        current_download_size: u64,
        full_download_size: u64,
        current_decoded_size: u64,
        full_decoded_size: u64,
    },
}

/// Sizes reported with a progress update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub current_download_size: u64,
    pub full_download_size: u64,
    pub current_decoded_size: u64,
    pub full_decoded_size: u64,
}

pub type ManagerRegistry = SessionRegistry<SubscriptionId, ManagerNotification>;
pub type DownloadRegistry = SessionRegistry<DownloadKey, DownloadStateNotification>;

/// Callback for a client's download manager session
#[derive(Clone)]
pub struct DownloadManagerCallback {
    registry: ManagerRegistry,
    token: SessionToken<SubscriptionId>,
}

impl DownloadManagerCallback {
    pub(crate) fn new(registry: ManagerRegistry, token: SessionToken<SubscriptionId>) -> Self {
        Self { registry, token }
    }

    /// The registration this callback delivers to
    pub fn token(&self) -> &SessionToken<SubscriptionId> {
        &self.token
    }

    /// Report an error to the client
    pub async fn on_error(&self, code: ResultCode, message: impl Into<String>) -> DispatchResult {
        self.send(ManagerNotification::Error {
            code: code.code(),
            message: message.into(),
        })
        .await
    }

    /// Report the file services matching the client's service classes
    pub async fn on_file_services_updated(&self, services: Vec<FileServiceInfo>) -> DispatchResult {
        self.send(ManagerNotification::FileServicesUpdated { services })
            .await
    }

    /// Tell the client the middleware has finished starting up
    pub async fn on_middleware_ready(&self) -> DispatchResult {
        self.send(ManagerNotification::MiddlewareReady).await
    }

    async fn send(&self, notification: ManagerNotification) -> DispatchResult {
        self.registry.dispatch_token(&self.token, notification).await
    }
}

/// Callback for progress on one download request
#[derive(Clone)]
pub struct DownloadStateCallback {
    registry: DownloadRegistry,
    token: SessionToken<DownloadKey>,
}

impl DownloadStateCallback {
    pub(crate) fn new(registry: DownloadRegistry, token: SessionToken<DownloadKey>) -> Self {
        Self { registry, token }
    }

    /// The registration this callback delivers to
    pub fn token(&self) -> &SessionToken<DownloadKey> {
        &self.token
    }

    /// Report progress on one file of a request
    pub async fn on_progress_updated(
        &self,
        request: &DownloadRequest,
        file: &FileInfo,
        progress: Progress,
    ) -> DispatchResult {
        let notification = DownloadStateNotification::Progress {
            request: request.clone(),
            file: file.clone(),
            current_download_size: progress.current_download_size,
            full_download_size: progress.full_download_size,
            current_decoded_size: progress.current_decoded_size,
            full_decoded_size: progress.full_decoded_size,
        };
        self.registry.dispatch_token(&self.token, notification).await
    }
}
