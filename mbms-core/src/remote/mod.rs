//! Remote callback endpoints
//!
//! The [`RemoteCallback`] abstraction stands in for a cross-process
//! callback handle: it can deliver notifications and report its own death
//! through a single-fire recipient.

pub mod mock;
pub mod traits;

// Re-export key types for convenience
pub use mock::MockRemote;
pub use traits::{DeathLink, DeathRecipient, RemoteCallback};
