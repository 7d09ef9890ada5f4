//! SessionRegistry for liveness-tracked callback sessions
//!
//! The registry holds at most one live remote callback per
//! (client, key) pair. Each registration links a death recipient to the
//! remote; when the remote dies, or a delivery to it fails, the session is
//! evicted and the configured [`EvictionHandler`] is told.
//!
//! Every session is stamped with a generation. Failure signals carry the
//! generation they were armed for and are dropped if the slot has since
//! been superseded or invalidated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RemoteError};
use crate::remote::{DeathLink, DeathRecipient, RemoteCallback};

use super::events::{EvictionHandler, EvictionReason, RegistryEvent};
use super::types::{Generation, SessionId, SessionInfo, SessionKey, SessionState, SessionToken};

/// Outcome of dispatching a notification
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// The remote accepted the notification
    Delivered,
    /// No session is registered for the key; treat as a no-op
    NoSuchSession,
    /// The remote failed; the session has been evicted
    DeliveryFailed(RemoteError),
}

impl DispatchResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

struct SessionEntry<N> {
    generation: Generation,
    remote: Arc<dyn RemoteCallback<N>>,
    link: DeathLink,
    registered_at: DateTime<Utc>,
}

struct RegistryInner<K, N> {
    name: String,
    sessions: Mutex<HashMap<SessionId<K>, SessionEntry<N>>>,
    next_generation: AtomicU64,
    eviction_handler: Arc<dyn EvictionHandler<K>>,
    tx: broadcast::Sender<RegistryEvent<K>>,
}

/// Registry of liveness-tracked callback sessions
///
/// Cheap to clone; clones share the same sessions. Safe to call from any
/// number of tasks, and death recipients may fire on any thread.
pub struct SessionRegistry<K, N> {
    inner: Arc<RegistryInner<K, N>>,
}

impl<K, N> Clone for SessionRegistry<K, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, N> SessionRegistry<K, N>
where
    K: SessionKey,
    N: Send + 'static,
{
    /// Create a registry that reports evictions to `eviction_handler`
    pub fn new(config: RegistryConfig, eviction_handler: Arc<dyn EvictionHandler<K>>) -> Self {
        let (tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(RegistryInner {
                name: config.name,
                sessions: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                eviction_handler,
                tx,
            }),
        }
    }

    /// Name used in log records
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register a remote callback for a session
    ///
    /// Supersedes any existing session for the same id without firing the
    /// eviction handler. Fails with `InvalidArgument` if the remote is
    /// already dead.
    pub fn register(
        &self,
        id: SessionId<K>,
        remote: Arc<dyn RemoteCallback<N>>,
    ) -> Result<SessionToken<K>, RegistryError> {
        if !remote.is_alive() {
            return Err(RegistryError::InvalidArgument(format!(
                "callback for session {} is already dead",
                id
            )));
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let link = remote
            .link_to_death(self.death_recipient(id.clone(), generation))
            .map_err(|e| {
                RegistryError::InvalidArgument(format!(
                    "cannot monitor callback for session {}: {}",
                    id, e
                ))
            })?;

        let entry = SessionEntry {
            generation,
            remote: Arc::clone(&remote),
            link,
            registered_at: Utc::now(),
        };
        let previous = self.inner.sessions().insert(id.clone(), entry);

        if let Some(previous) = previous {
            previous.remote.unlink_to_death(previous.link);
            debug!(
                registry = %self.inner.name,
                client = id.client,
                key = ?id.key,
                generation = previous.generation,
                "Superseded session"
            );
            self.inner.publish(RegistryEvent::Superseded {
                id: id.clone(),
                generation: previous.generation,
            });
        }

        info!(
            registry = %self.inner.name,
            client = id.client,
            key = ?id.key,
            generation,
            "Registered session"
        );
        self.inner.publish(RegistryEvent::Registered {
            id: id.clone(),
            generation,
        });

        // A recipient that fired before the slot was filled was dropped as stale
        if !remote.is_alive() {
            self.inner.evict(&id, generation, EvictionReason::RemoteDied);
        }

        Ok(SessionToken { id, generation })
    }

    /// Forward a notification to the session's remote
    ///
    /// The registry lock is not held while delivering. A failed delivery
    /// evicts the session; there is no retry.
    pub async fn dispatch(&self, id: &SessionId<K>, notification: N) -> DispatchResult {
        self.dispatch_matching(id, None, notification).await
    }

    /// Forward a notification only if `token` is still the live registration
    ///
    /// Callback objects handed out for one registration use this so they
    /// never reach a session that superseded theirs.
    pub async fn dispatch_token(&self, token: &SessionToken<K>, notification: N) -> DispatchResult {
        self.dispatch_matching(&token.id, Some(token.generation), notification)
            .await
    }

    async fn dispatch_matching(
        &self,
        id: &SessionId<K>,
        expected: Option<Generation>,
        notification: N,
    ) -> DispatchResult {
        let found = self
            .inner
            .lookup(id)
            .filter(|(_, generation)| expected.is_none_or(|expected| expected == *generation));
        let Some((remote, generation)) = found else {
            debug!(
                registry = %self.inner.name,
                client = id.client,
                key = ?id.key,
                "Dropping notification for unknown session"
            );
            return DispatchResult::NoSuchSession;
        };

        match remote.deliver(notification).await {
            Ok(()) => {
                debug!(
                    registry = %self.inner.name,
                    client = id.client,
                    key = ?id.key,
                    generation,
                    "Delivered notification"
                );
                DispatchResult::Delivered
            }
            Err(error) => {
                warn!(
                    registry = %self.inner.name,
                    client = id.client,
                    key = ?id.key,
                    generation,
                    error = %error,
                    "Delivery to remote callback failed"
                );
                self.inner
                    .evict(id, generation, EvictionReason::DeliveryFailed);
                DispatchResult::DeliveryFailed(error)
            }
        }
    }

    /// Tear down a session explicitly
    ///
    /// Returns whether a session was removed. Never fires the eviction
    /// handler.
    pub fn invalidate(&self, id: &SessionId<K>) -> bool {
        let removed = self.inner.sessions().remove(id);
        let Some(entry) = removed else {
            debug!(
                registry = %self.inner.name,
                client = id.client,
                key = ?id.key,
                "Invalidate on unknown session"
            );
            return false;
        };

        entry.remote.unlink_to_death(entry.link);
        info!(
            registry = %self.inner.name,
            client = id.client,
            key = ?id.key,
            generation = entry.generation,
            "Invalidated session"
        );
        self.inner.publish(RegistryEvent::Invalidated {
            id: id.clone(),
            generation: entry.generation,
        });
        true
    }

    /// Tear down every session; returns how many were removed
    pub fn invalidate_all(&self) -> usize {
        let drained: Vec<(SessionId<K>, SessionEntry<N>)> =
            self.inner.sessions().drain().collect();
        let count = drained.len();

        for (id, entry) in drained {
            entry.remote.unlink_to_death(entry.link);
            self.inner.publish(RegistryEvent::Invalidated {
                id,
                generation: entry.generation,
            });
        }

        if count > 0 {
            info!(registry = %self.inner.name, count, "Invalidated all sessions");
        }
        count
    }

    /// Whether a session is registered for the id
    pub fn contains(&self, id: &SessionId<K>) -> bool {
        self.inner.sessions().contains_key(id)
    }

    /// Snapshot of the session registered for the id
    pub fn session(&self, id: &SessionId<K>) -> Option<SessionInfo<K>> {
        self.inner
            .sessions()
            .get(id)
            .map(|entry| entry.info(id.clone()))
    }

    /// Snapshots of every registered session
    pub fn list_sessions(&self) -> Vec<SessionInfo<K>> {
        self.inner
            .sessions()
            .iter()
            .map(|(id, entry)| entry.info(id.clone()))
            .collect()
    }

    /// Number of registered sessions
    pub fn session_count(&self) -> usize {
        self.inner.sessions().len()
    }

    /// Subscribe to registry events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent<K>> {
        self.inner.tx.subscribe()
    }

    /// Build the recipient linked to a remote for one generation
    ///
    /// Holds only a weak reference so a linked remote never keeps the
    /// registry alive.
    fn death_recipient(&self, id: SessionId<K>, generation: Generation) -> DeathRecipient {
        let inner: Weak<RegistryInner<K, N>> = Arc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.evict(&id, generation, EvictionReason::RemoteDied);
            }
        })
    }
}

impl<N> SessionEntry<N> {
    fn info<K>(&self, id: SessionId<K>) -> SessionInfo<K> {
        SessionInfo {
            id,
            generation: self.generation,
            state: SessionState::Active,
            registered_at: self.registered_at,
        }
    }
}

impl<K, N> RegistryInner<K, N>
where
    K: SessionKey,
    N: Send + 'static,
{
    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId<K>, SessionEntry<N>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, id: &SessionId<K>) -> Option<(Arc<dyn RemoteCallback<N>>, Generation)> {
        self.sessions()
            .get(id)
            .map(|entry| (Arc::clone(&entry.remote), entry.generation))
    }

    /// Remove the session if it still has `generation`, then report it
    ///
    /// Returns false for stale signals.
    fn evict(&self, id: &SessionId<K>, generation: Generation, reason: EvictionReason) -> bool {
        let removed = {
            let mut sessions = self.sessions();
            let current = sessions.get(id).map(|entry| entry.generation);
            if current == Some(generation) {
                sessions.remove(id)
            } else {
                None
            }
        };

        let Some(entry) = removed else {
            debug!(
                registry = %self.name,
                client = id.client,
                key = ?id.key,
                generation,
                ?reason,
                "Ignoring stale failure signal"
            );
            return false;
        };

        // A fired recipient is already gone; unlinking from inside it could
        // re-enter the transport
        if reason == EvictionReason::DeliveryFailed {
            entry.remote.unlink_to_death(entry.link);
        }

        info!(
            registry = %self.name,
            client = id.client,
            key = ?id.key,
            generation,
            ?reason,
            "Evicted session"
        );
        self.eviction_handler.on_eviction(id, reason);
        self.publish(RegistryEvent::Evicted {
            id: id.clone(),
            generation,
            reason,
        });
        true
    }

    fn publish(&self, event: RegistryEvent<K>) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}
