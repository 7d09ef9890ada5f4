//! DownloadServiceHost: the client-facing side of a vendor service
//!
//! The host receives raw client calls carrying remote callback handles,
//! registers those handles in a [`SessionRegistry`], hands the vendor typed
//! callbacks instead, and reports dead clients through
//! [`DownloadService::on_app_callback_died`].

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use mbms_core::{
    ClientUid, EvictionHandler, EvictionReason, RemoteCallback, SessionId, SessionRegistry,
};
use tracing::{info, warn};

use crate::callback::{
    DownloadManagerCallback, DownloadRegistry, DownloadStateCallback, DownloadStateNotification,
    ManagerNotification, ManagerRegistry,
};
use crate::config::ServiceConfig;
use crate::error::DownloadError;
use crate::service::DownloadService;
use crate::types::{
    DownloadKey, DownloadRequest, DownloadStatus, FileInfo, ResultCode, SubscriptionId,
};

/// Reports evicted sessions to the vendor
///
/// Holds the vendor weakly; vendors commonly keep callbacks, which keep the
/// registries alive.
struct AppDeathReporter<S> {
    service: Weak<S>,
}

impl<S: DownloadService> AppDeathReporter<S> {
    fn report(&self, uid: ClientUid, subscription_id: SubscriptionId, reason: EvictionReason) {
        let Some(service) = self.service.upgrade() else {
            return;
        };
        info!(
            client = uid,
            subscription = %subscription_id,
            ?reason,
            "App callback died"
        );
        service.on_app_callback_died(uid, subscription_id);
    }
}

impl<S: DownloadService> EvictionHandler<SubscriptionId> for AppDeathReporter<S> {
    fn on_eviction(&self, id: &SessionId<SubscriptionId>, reason: EvictionReason) {
        self.report(id.client, id.key, reason);
    }
}

impl<S: DownloadService> EvictionHandler<DownloadKey> for AppDeathReporter<S> {
    fn on_eviction(&self, id: &SessionId<DownloadKey>, reason: EvictionReason) {
        self.report(id.client, id.key.subscription_id, reason);
    }
}

/// Adapts client calls onto a [`DownloadService`]
pub struct DownloadServiceHost<S> {
    service: Arc<S>,
    managers: ManagerRegistry,
    downloads: DownloadRegistry,
    initialize_failure_code: ResultCode,
}

impl<S> DownloadServiceHost<S>
where
    S: DownloadService + 'static,
{
    /// Create a host for a vendor service
    pub fn new(service: S, config: ServiceConfig) -> Self {
        let service = Arc::new(service);
        let reporter = Arc::new(AppDeathReporter {
            service: Arc::downgrade(&service),
        });

        Self {
            managers: SessionRegistry::new(config.manager_registry, reporter.clone()),
            downloads: SessionRegistry::new(config.download_registry, reporter),
            initialize_failure_code: config.initialize_failure_code,
            service,
        }
    }

    /// The wrapped vendor service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Registry of manager callbacks, keyed by subscription
    pub fn managers(&self) -> &ManagerRegistry {
        &self.managers
    }

    /// Registry of download progress callbacks, keyed by request
    pub fn downloads(&self) -> &DownloadRegistry {
        &self.downloads
    }

    /// Initialize the service for a client, registering its callback
    ///
    /// A dead callback or a vendor error becomes the configured
    /// `initialize_failure_code` ([`ResultCode::UnableToInitialize`] by default).
    pub async fn initialize(
        &self,
        uid: ClientUid,
        subscription_id: SubscriptionId,
        remote: Arc<dyn RemoteCallback<ManagerNotification>>,
    ) -> ResultCode {
        let token = match self
            .managers
            .register(SessionId::new(uid, subscription_id), remote)
        {
            Ok(token) => token,
            Err(e) => {
                warn!(client = uid, subscription = %subscription_id, error = %e, "Rejected initialize");
                return self.initialize_failure_code;
            }
        };

        let callback = DownloadManagerCallback::new(self.managers.clone(), token);
        match self
            .service
            .initialize(uid, subscription_id, callback)
            .await
        {
            Ok(code) => code,
            Err(e) => {
                warn!(client = uid, subscription = %subscription_id, error = %e, "Service failed to initialize");
                self.initialize_failure_code
            }
        }
    }

    pub async fn get_file_services(
        &self,
        uid: ClientUid,
        subscription_id: SubscriptionId,
        service_classes: Vec<String>,
    ) -> Result<ResultCode, DownloadError> {
        Ok(self
            .service
            .get_file_services(uid, subscription_id, service_classes)
            .await?)
    }

    pub async fn set_temp_file_root_directory(
        &self,
        uid: ClientUid,
        subscription_id: SubscriptionId,
        root_directory: PathBuf,
    ) -> Result<ResultCode, DownloadError> {
        Ok(self
            .service
            .set_temp_file_root_directory(uid, subscription_id, root_directory)
            .await?)
    }

    /// Start a download, registering the client's progress callback
    pub async fn download(
        &self,
        uid: ClientUid,
        request: DownloadRequest,
        remote: Arc<dyn RemoteCallback<DownloadStateNotification>>,
    ) -> Result<ResultCode, DownloadError> {
        let token = self
            .downloads
            .register(SessionId::new(uid, request.key()), remote)?;
        let callback = DownloadStateCallback::new(self.downloads.clone(), token);
        Ok(self.service.download(uid, request, callback).await?)
    }

    pub async fn list_pending_downloads(
        &self,
        uid: ClientUid,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<DownloadRequest>, DownloadError> {
        Ok(self
            .service
            .list_pending_downloads(uid, subscription_id)
            .await?)
    }

    /// Cancel a download; on success its progress callback is released
    pub async fn cancel_download(
        &self,
        uid: ClientUid,
        request: &DownloadRequest,
    ) -> Result<ResultCode, DownloadError> {
        let code = self.service.cancel_download(uid, request).await?;
        if code.is_success() {
            self.downloads
                .invalidate(&SessionId::new(uid, request.key()));
        }
        Ok(code)
    }

    pub async fn get_download_status(
        &self,
        uid: ClientUid,
        request: &DownloadRequest,
        file: &FileInfo,
    ) -> Result<DownloadStatus, DownloadError> {
        Ok(self
            .service
            .get_download_status(uid, request, file)
            .await?)
    }

    pub async fn reset_download_knowledge(
        &self,
        uid: ClientUid,
        request: &DownloadRequest,
    ) -> Result<ResultCode, DownloadError> {
        Ok(self
            .service
            .reset_download_knowledge(uid, request)
            .await?)
    }

    /// Dispose of a client's session for a subscription
    ///
    /// The manager callback is released without a death report; download
    /// callbacks stay registered because pending downloads stay in effect.
    pub async fn dispose(
        &self,
        uid: ClientUid,
        subscription_id: SubscriptionId,
    ) -> Result<(), DownloadError> {
        self.managers
            .invalidate(&SessionId::new(uid, subscription_id));
        Ok(self.service.dispose(uid, subscription_id).await?)
    }

    /// Release every registered callback without death reports
    pub fn shutdown(&self) {
        let managers = self.managers.invalidate_all();
        let downloads = self.downloads.invalidate_all();
        info!(managers, downloads, "Download service host shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mbms_core::{MockRemote, RemoteError};

    use crate::callback::Progress;
    use crate::error::ServiceError;

    /// Vendor that records calls and keeps the callbacks it is given
    #[derive(Default)]
    struct RecordingService {
        deaths: Mutex<Vec<(ClientUid, SubscriptionId)>>,
        managers: Mutex<Vec<DownloadManagerCallback>>,
        downloads: Mutex<Vec<DownloadStateCallback>>,
        fail_initialize: bool,
        cancel_code: Option<ResultCode>,
    }

    impl RecordingService {
        fn deaths(&self) -> Vec<(ClientUid, SubscriptionId)> {
            self.deaths.lock().unwrap().clone()
        }

        fn manager_callback(&self, index: usize) -> DownloadManagerCallback {
            self.managers.lock().unwrap()[index].clone()
        }

        fn download_callback(&self, index: usize) -> DownloadStateCallback {
            self.downloads.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl DownloadService for RecordingService {
        async fn initialize(
            &self,
            _uid: ClientUid,
            _subscription_id: SubscriptionId,
            callback: DownloadManagerCallback,
        ) -> Result<ResultCode, ServiceError> {
            if self.fail_initialize {
                return Err(ServiceError::IllegalState("no radio".to_string()));
            }
            self.managers.lock().unwrap().push(callback);
            Ok(ResultCode::Success)
        }

        async fn download(
            &self,
            _uid: ClientUid,
            _request: DownloadRequest,
            callback: DownloadStateCallback,
        ) -> Result<ResultCode, ServiceError> {
            self.downloads.lock().unwrap().push(callback);
            Ok(ResultCode::Success)
        }

        async fn cancel_download(
            &self,
            _uid: ClientUid,
            _request: &DownloadRequest,
        ) -> Result<ResultCode, ServiceError> {
            Ok(self.cancel_code.unwrap_or(ResultCode::Success))
        }

        fn on_app_callback_died(&self, uid: ClientUid, subscription_id: SubscriptionId) {
            self.deaths.lock().unwrap().push((uid, subscription_id));
        }
    }

    fn create_test_host(service: RecordingService) -> DownloadServiceHost<RecordingService> {
        DownloadServiceHost::new(service, ServiceConfig::default())
    }

    fn manager_remote() -> Arc<MockRemote<ManagerNotification>> {
        Arc::new(MockRemote::new())
    }

    fn download_remote() -> Arc<MockRemote<DownloadStateNotification>> {
        Arc::new(MockRemote::new())
    }

    const UID: ClientUid = 10042;
    const SUB: SubscriptionId = SubscriptionId(1);

    // ==================== Initialize Tests ====================

    #[tokio::test]
    async fn initialize_registers_callback_and_calls_service() {
        let host = create_test_host(RecordingService::default());
        let remote = manager_remote();

        let code = host.initialize(UID, SUB, remote.clone()).await;

        assert_eq!(code, ResultCode::Success);
        assert!(host.managers().contains(&SessionId::new(UID, SUB)));
        assert_eq!(host.service().managers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn initialize_with_dead_callback_is_unable_to_initialize() {
        let host = create_test_host(RecordingService::default());
        let dead: Arc<MockRemote<ManagerNotification>> = Arc::new(MockRemote::dead());

        let code = host.initialize(UID, SUB, dead).await;

        assert_eq!(code, ResultCode::UnableToInitialize);
        assert!(host.service().managers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn initialize_service_error_is_unable_to_initialize() {
        let host = create_test_host(RecordingService {
            fail_initialize: true,
            ..RecordingService::default()
        });

        let code = host.initialize(UID, SUB, manager_remote()).await;

        assert_eq!(code, ResultCode::UnableToInitialize);
    }

    #[tokio::test]
    async fn initialize_failures_use_configured_code() {
        let config = ServiceConfig::from_toml_str("initialize_failure_code = 201").unwrap();
        let host = DownloadServiceHost::new(
            RecordingService {
                fail_initialize: true,
                ..RecordingService::default()
            },
            config,
        );
        let dead: Arc<MockRemote<ManagerNotification>> = Arc::new(MockRemote::dead());

        let service_error = host.initialize(UID, SUB, manager_remote()).await;
        let rejected = host.initialize(UID, SubscriptionId(2), dead).await;

        assert_eq!(service_error, ResultCode::MiddlewareNotYetReady);
        assert_eq!(rejected, ResultCode::MiddlewareNotYetReady);
    }

    #[tokio::test]
    async fn manager_callback_reaches_client() {
        let host = create_test_host(RecordingService::default());
        let remote = manager_remote();
        host.initialize(UID, SUB, remote.clone()).await;

        let callback = host.service().manager_callback(0);
        callback.on_middleware_ready().await;

        assert_eq!(remote.delivered(), vec![ManagerNotification::MiddlewareReady]);
    }

    #[tokio::test]
    async fn reinitialize_routes_old_callback_nowhere() {
        let host = create_test_host(RecordingService::default());
        let first = manager_remote();
        let second = manager_remote();
        host.initialize(UID, SUB, first.clone()).await;
        host.initialize(UID, SUB, second.clone()).await;

        let stale = host.service().manager_callback(0);
        let result = stale.on_middleware_ready().await;

        assert_eq!(result, mbms_core::DispatchResult::NoSuchSession);
        assert_eq!(first.delivered_count(), 0);
        assert_eq!(second.delivered_count(), 0);
        assert!(host.service().deaths().is_empty());
    }

    // ==================== Death Reporting Tests ====================

    #[tokio::test]
    async fn manager_death_reports_app_callback_died() {
        let host = create_test_host(RecordingService::default());
        let remote = manager_remote();
        host.initialize(UID, SUB, remote.clone()).await;

        remote.kill();

        assert_eq!(host.service().deaths(), vec![(UID, SUB)]);
        assert!(!host.managers().contains(&SessionId::new(UID, SUB)));
    }

    #[tokio::test]
    async fn failed_delivery_reports_app_callback_died() {
        let host = create_test_host(RecordingService::default());
        let remote = manager_remote();
        host.initialize(UID, SUB, remote.clone()).await;
        remote.fail_next_delivery(RemoteError::TransactionFailed("oneway".to_string()));

        let result = host
            .service()
            .manager_callback(0)
            .on_error(ResultCode::MiddlewareNotYetReady, "warming up")
            .await;

        assert!(matches!(result, mbms_core::DispatchResult::DeliveryFailed(_)));
        assert_eq!(host.service().deaths(), vec![(UID, SUB)]);
    }

    #[tokio::test]
    async fn download_callback_death_reports_subscription() {
        let host = create_test_host(RecordingService::default());
        let request = DownloadRequest::new(SubscriptionId(3), "bcast://news", "/tmp/news");
        let remote = download_remote();

        host.download(UID, request, remote.clone()).await.unwrap();
        remote.kill();

        assert_eq!(host.service().deaths(), vec![(UID, SubscriptionId(3))]);
    }

    #[tokio::test]
    async fn dispose_does_not_report_death() {
        let host = create_test_host(RecordingService::default());
        let remote = manager_remote();
        host.initialize(UID, SUB, remote.clone()).await;

        host.dispose(UID, SUB).await.unwrap();
        remote.kill();

        assert!(host.service().deaths().is_empty());
        assert_eq!(host.managers().session_count(), 0);
    }

    // ==================== Download Tests ====================

    #[tokio::test]
    async fn download_progress_reaches_client() {
        let host = create_test_host(RecordingService::default());
        let request = DownloadRequest::new(SUB, "bcast://news", "/tmp/news");
        let file = FileInfo {
            uri: "bcast://news/1".to_string(),
            mime_type: "text/html".to_string(),
        };
        let remote = download_remote();
        host.download(UID, request.clone(), remote.clone())
            .await
            .unwrap();

        host.service()
            .download_callback(0)
            .on_progress_updated(&request, &file, Progress::default())
            .await;

        assert_eq!(remote.delivered_count(), 1);
    }

    #[tokio::test]
    async fn download_with_dead_callback_fails() {
        let host = create_test_host(RecordingService::default());
        let request = DownloadRequest::new(SUB, "bcast://news", "/tmp/news");
        let dead: Arc<MockRemote<DownloadStateNotification>> = Arc::new(MockRemote::dead());

        let result = host.download(UID, request, dead).await;

        assert!(matches!(result, Err(DownloadError::Registry(_))));
        assert!(host.service().downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_download_releases_callback() {
        let host = create_test_host(RecordingService::default());
        let request = DownloadRequest::new(SUB, "bcast://news", "/tmp/news");
        let remote = download_remote();
        host.download(UID, request.clone(), remote.clone())
            .await
            .unwrap();

        let code = host.cancel_download(UID, &request).await.unwrap();

        assert_eq!(code, ResultCode::Success);
        assert_eq!(host.downloads().session_count(), 0);
        assert_eq!(remote.linked_count(), 0);
    }

    #[tokio::test]
    async fn failed_cancel_keeps_callback() {
        let host = create_test_host(RecordingService {
            cancel_code: Some(ResultCode::UnknownDownloadRequest),
            ..RecordingService::default()
        });
        let request = DownloadRequest::new(SUB, "bcast://news", "/tmp/news");
        host.download(UID, request.clone(), download_remote())
            .await
            .unwrap();

        let code = host.cancel_download(UID, &request).await.unwrap();

        assert_eq!(code, ResultCode::UnknownDownloadRequest);
        assert_eq!(host.downloads().session_count(), 1);
    }

    #[tokio::test]
    async fn dispose_keeps_download_callbacks() {
        let host = create_test_host(RecordingService::default());
        host.initialize(UID, SUB, manager_remote()).await;
        let request = DownloadRequest::new(SUB, "bcast://news", "/tmp/news");
        host.download(UID, request, download_remote()).await.unwrap();

        host.dispose(UID, SUB).await.unwrap();

        assert_eq!(host.downloads().session_count(), 1);
    }

    // ==================== Forwarding Tests ====================

    #[tokio::test]
    async fn unimplemented_methods_use_service_defaults() {
        let host = create_test_host(RecordingService::default());
        let request = DownloadRequest::new(SUB, "bcast://news", "/tmp/news");
        let file = FileInfo {
            uri: "bcast://news/1".to_string(),
            mime_type: "text/html".to_string(),
        };

        assert_eq!(
            host.get_file_services(UID, SUB, vec!["news".to_string()])
                .await
                .unwrap(),
            ResultCode::Success
        );
        assert_eq!(
            host.set_temp_file_root_directory(UID, SUB, PathBuf::from("/data/tmp"))
                .await
                .unwrap(),
            ResultCode::Success
        );
        assert!(host.list_pending_downloads(UID, SUB).await.unwrap().is_empty());
        assert_eq!(
            host.get_download_status(UID, &request, &file).await.unwrap(),
            DownloadStatus::Unknown
        );
        assert_eq!(
            host.reset_download_knowledge(UID, &request).await.unwrap(),
            ResultCode::Success
        );
    }

    #[tokio::test]
    async fn shutdown_releases_everything_silently() {
        let host = create_test_host(RecordingService::default());
        let manager = manager_remote();
        let download = download_remote();
        host.initialize(UID, SUB, manager.clone()).await;
        host.download(UID, DownloadRequest::new(SUB, "bcast://a", "/tmp/a"), download.clone())
            .await
            .unwrap();

        host.shutdown();
        manager.kill();
        download.kill();

        assert_eq!(host.managers().session_count(), 0);
        assert_eq!(host.downloads().session_count(), 0);
        assert!(host.service().deaths().is_empty());
    }
}
