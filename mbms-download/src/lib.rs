//! mbms-download: Default-implementation host for broadcast download middleware
//!
//! A middleware vendor implements [`DownloadService`], overriding only the
//! calls it supports, and wraps it in a [`DownloadServiceHost`]. The host
//! takes care of the client-facing plumbing:
//!
//! - **Callback registration** - remote callbacks are held in
//!   [`mbms_core::SessionRegistry`] instances, one per callback kind
//! - **Typed callbacks** - the vendor receives [`DownloadManagerCallback`]
//!   and [`DownloadStateCallback`] instead of raw remote handles
//! - **Death reporting** - a client that dies, or whose callback fails,
//!   is reported once through [`DownloadService::on_app_callback_died`]
//!
//! # Architecture
//!
//! ```text
//! client ──initialize/download──▶ DownloadServiceHost ──▶ DownloadService (vendor)
//!    ▲                               │        ▲                  │
//!    │                        register│        │on_app_callback   │typed callbacks
//!    │                               ▼        │_died             ▼
//!    └──────────deliver────────── SessionRegistry ◀──────── dispatch_token
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod host;
pub mod service;
pub mod types;

// Re-export key types for convenience
pub use callback::{
    DownloadManagerCallback, DownloadRegistry, DownloadStateCallback, DownloadStateNotification,
    ManagerNotification, ManagerRegistry, Progress,
};
pub use config::ServiceConfig;
pub use error::{DownloadError, ServiceError};
pub use host::DownloadServiceHost;
pub use service::DownloadService;
pub use types::{
    DownloadKey, DownloadRequest, DownloadStatus, FileInfo, FileServiceInfo, ResultCode,
    SubscriptionId,
};
