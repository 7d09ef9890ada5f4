//! Session callback registry

pub mod events;
pub mod registry;
pub mod types;

// Re-export key types for convenience
pub use events::{EvictionHandler, EvictionReason, IgnoreEvictions, RegistryEvent};
pub use registry::{DispatchResult, SessionRegistry};
pub use types::{ClientUid, Generation, SessionId, SessionInfo, SessionKey, SessionState, SessionToken};
