//! mbms-core: Liveness-tracked callback sessions for broadcast download middleware
//!
//! This crate provides the pieces a middleware service needs to talk back
//! to client processes safely:
//!
//! - **Remote callbacks** - [`RemoteCallback`] abstracts a cross-process
//!   callback handle with single-fire death notification
//! - **Session registry** - [`SessionRegistry`] holds one live callback per
//!   (client, key), evicting it when the remote dies or a delivery fails
//! - **Registry events** - [`RegistryEvent`] for observing session lifecycle
//! - **Testing** - [`MockRemote`] for scripting remote behavior
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mbms_core::{
//!     EvictionReason, MockRemote, RegistryConfig, SessionId, SessionRegistry,
//! };
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let on_eviction = |id: &SessionId<i32>, reason: EvictionReason| {
//!         println!("client {} went away: {:?}", id.client, reason);
//!     };
//!     let registry: SessionRegistry<i32, String> =
//!         SessionRegistry::new(RegistryConfig::named("manager"), Arc::new(on_eviction));
//!
//!     let remote = Arc::new(MockRemote::<String>::new());
//!     let id = SessionId::new(10042, 1);
//!     registry.register(id.clone(), remote)?;
//!
//!     registry.dispatch(&id, "middleware ready".to_string()).await;
//!     Ok(())
//! }
//! ```
//!
//! # Session lifecycle
//!
//! ```text
//!            register                 invalidate
//!   (none) ──────────▶ Active ──────────────────────▶ Invalidated
//!                        │                              (no hook)
//!                        │ remote died / delivery failed
//!                        ├─────────────────────────────▶ Invalidated
//!                        │                              (on_eviction)
//!                        │ register same key
//!                        └─────────────────────────────▶ Superseded
//!                                                       (no hook)
//! ```

pub mod config;
pub mod error;
pub mod remote;
pub mod session;

// Re-export key types for convenience
pub use config::RegistryConfig;
pub use error::{ConfigError, MbmsError, RegistryError, RemoteError};
pub use remote::{DeathLink, DeathRecipient, MockRemote, RemoteCallback};
pub use session::{
    ClientUid, DispatchResult, EvictionHandler, EvictionReason, Generation, IgnoreEvictions,
    RegistryEvent, SessionId, SessionInfo, SessionKey, SessionRegistry, SessionState,
    SessionToken,
};
