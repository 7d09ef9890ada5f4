//! Mock remote endpoint for testing
//!
//! MockRemote records every delivered notification and lets tests kill the
//! endpoint or script delivery failures, enabling deterministic tests of
//! registry and host logic without a real transport.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::traits::{DeathLink, DeathRecipient, RemoteCallback};
use crate::error::RemoteError;

/// In-process implementation of RemoteCallback for tests
///
/// Call `kill()` to simulate the client process dying; every linked
/// recipient fires exactly once. Queue failures with `fail_next_delivery()`.
pub struct MockRemote<N> {
    /// Notifications delivered so far
    delivered: Mutex<Vec<N>>,
    /// Whether the endpoint is reachable
    alive: AtomicBool,
    /// Linked death recipients by link id
    recipients: Mutex<HashMap<u64, DeathRecipient>>,
    /// Next link id to assign
    next_link: AtomicU64,
    /// Scripted failures (each deliver() consumes one)
    failures: Mutex<VecDeque<RemoteError>>,
}

impl<N> MockRemote<N> {
    /// Create a live endpoint
    pub fn new() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            alive: AtomicBool::new(true),
            recipients: Mutex::new(HashMap::new()),
            next_link: AtomicU64::new(0),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Create an endpoint that is already dead
    pub fn dead() -> Self {
        let remote = Self::new();
        remote.alive.store(false, Ordering::SeqCst);
        remote
    }

    /// Simulate the remote process dying
    ///
    /// Fires every linked recipient once. Killing a dead endpoint does nothing.
    pub fn kill(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }

        let recipients: Vec<DeathRecipient> = self
            .recipients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, recipient)| recipient)
            .collect();

        for recipient in recipients {
            recipient();
        }
    }

    /// Make the next deliver() fail with the given error
    ///
    /// The endpoint stays alive; only the delivery fails.
    pub fn fail_next_delivery(&self, error: RemoteError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Number of recipients currently linked
    pub fn linked_count(&self) -> usize {
        self.recipients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of notifications delivered so far
    pub fn delivered_count(&self) -> usize {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<N: Clone> MockRemote<N> {
    /// Copy of every notification delivered so far
    pub fn delivered(&self) -> Vec<N> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<N> Default for MockRemote<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<N> RemoteCallback<N> for MockRemote<N>
where
    N: Send + 'static,
{
    async fn deliver(&self, notification: N) -> Result<(), RemoteError> {
        if !self.is_alive() {
            return Err(RemoteError::DeadObject);
        }

        let scripted = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn link_to_death(&self, recipient: DeathRecipient) -> Result<DeathLink, RemoteError> {
        let mut recipients = self
            .recipients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Checked under the lock so a concurrent kill() cannot miss this recipient
        if !self.is_alive() {
            return Err(RemoteError::DeadObject);
        }

        let id = self.next_link.fetch_add(1, Ordering::SeqCst);
        recipients.insert(id, recipient);
        Ok(DeathLink::new(id))
    }

    fn unlink_to_death(&self, link: DeathLink) -> bool {
        self.recipients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&link.id())
            .is_some()
    }
}
