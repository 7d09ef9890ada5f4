//! DownloadService trait
//!
//! Vendors implement this trait and override only what they support; every
//! method has a default that reports success or an empty result. The
//! [`DownloadServiceHost`](crate::DownloadServiceHost) adapts client RPCs
//! onto it.

use std::path::PathBuf;

use async_trait::async_trait;
use mbms_core::ClientUid;

use crate::callback::{DownloadManagerCallback, DownloadStateCallback};
use crate::error::ServiceError;
use crate::types::{DownloadRequest, DownloadStatus, FileInfo, ResultCode, SubscriptionId};

/// Middleware implementation of broadcast file download
///
/// Every call carries the calling client's uid. Errors returned from
/// `initialize` reach the client as
/// [`ResultCode::UnableToInitialize`]; errors from other calls are returned
/// to the client unchanged.
#[async_trait]
pub trait DownloadService: Send + Sync {
    /// Initialize the service for this client and subscription
    ///
    /// Non-success codes are passed to the client through
    /// [`DownloadManagerCallback::on_error`] by the client library.
    async fn initialize(
        &self,
        _uid: ClientUid,
        _subscription_id: SubscriptionId,
        _callback: DownloadManagerCallback,
    ) -> Result<ResultCode, ServiceError> {
        Ok(ResultCode::Success)
    }

    /// Register the service classes the client wants to hear about
    ///
    /// Matching services are reported later through
    /// [`DownloadManagerCallback::on_file_services_updated`]. A later call
    /// for the same client and subscription replaces the class list.
    async fn get_file_services(
        &self,
        _uid: ClientUid,
        _subscription_id: SubscriptionId,
        _service_classes: Vec<String>,
    ) -> Result<ResultCode, ServiceError> {
        Ok(ResultCode::Success)
    }

    /// Set the directory under which temp files for this client live
    ///
    /// Must return [`ResultCode::CannotChangeTempFileRoot`] while the
    /// client has downloads pending.
    async fn set_temp_file_root_directory(
        &self,
        _uid: ClientUid,
        _subscription_id: SubscriptionId,
        _root_directory: PathBuf,
    ) -> Result<ResultCode, ServiceError> {
        Ok(ResultCode::Success)
    }

    /// Start downloading the files described by `request`
    async fn download(
        &self,
        _uid: ClientUid,
        _request: DownloadRequest,
        _callback: DownloadStateCallback,
    ) -> Result<ResultCode, ServiceError> {
        Ok(ResultCode::Success)
    }

    /// Requests issued by this client that have not been cancelled
    async fn list_pending_downloads(
        &self,
        _uid: ClientUid,
        _subscription_id: SubscriptionId,
    ) -> Result<Vec<DownloadRequest>, ServiceError> {
        Ok(Vec::new())
    }

    /// Cancel a request; on success no further results arrive for it
    async fn cancel_download(
        &self,
        _uid: ClientUid,
        _request: &DownloadRequest,
    ) -> Result<ResultCode, ServiceError> {
        Ok(ResultCode::Success)
    }

    /// Status of one file within a request
    async fn get_download_status(
        &self,
        _uid: ClientUid,
        _request: &DownloadRequest,
        _file: &FileInfo,
    ) -> Result<DownloadStatus, ServiceError> {
        Ok(DownloadStatus::Unknown)
    }

    /// Forget which files of `request` were already downloaded
    ///
    /// In-progress downloads must not be interrupted.
    async fn reset_download_knowledge(
        &self,
        _uid: ClientUid,
        _request: &DownloadRequest,
    ) -> Result<ResultCode, ServiceError> {
        Ok(ResultCode::Success)
    }

    /// The client is done with this subscription's session
    ///
    /// Pending downloads stay in effect.
    async fn dispose(
        &self,
        _uid: ClientUid,
        _subscription_id: SubscriptionId,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    /// A callback registered by this client and subscription has died
    ///
    /// Called from the transport's death notification path; keep it short.
    fn on_app_callback_died(&self, _uid: ClientUid, _subscription_id: SubscriptionId) {}
}
