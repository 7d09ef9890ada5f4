//! RemoteCallback trait and death notification types

use std::fmt;

use async_trait::async_trait;

use crate::error::RemoteError;

/// Hook invoked when a linked remote endpoint dies
///
/// Implementations must call a recipient at most once, and never after it
/// has been unlinked.
pub type DeathRecipient = Box<dyn FnOnce() + Send + 'static>;

/// Handle for a linked death recipient, used to unlink it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeathLink(u64);

impl DeathLink {
    /// Wrap a transport-assigned link id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw link id
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeathLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// A callback endpoint living in another process
///
/// Implementations wrap whatever transport carries notifications to the
/// client. `deliver` is bounded by the transport's own timeout.
#[async_trait]
pub trait RemoteCallback<N>: Send + Sync {
    /// Forward a notification to the remote endpoint
    async fn deliver(&self, notification: N) -> Result<(), RemoteError>;

    /// Whether the remote endpoint is still reachable
    fn is_alive(&self) -> bool;

    /// Register a recipient to run when the remote endpoint dies
    ///
    /// Fails with [`RemoteError::DeadObject`] if the endpoint is already dead.
    fn link_to_death(&self, recipient: DeathRecipient) -> Result<DeathLink, RemoteError>;

    /// Remove a previously linked recipient
    ///
    /// Returns false if the link was unknown or had already fired.
    fn unlink_to_death(&self, link: DeathLink) -> bool;
}
