//! Session identity and state types

use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the calling principal, as reported by the transport
pub type ClientUid = u32;

/// Monotonically increasing number stamped on each registered session
pub type Generation = u64;

/// Bounds required of an application-chosen session key
pub trait SessionKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> SessionKey for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Unique identifier of a session: the calling client plus its key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId<K> {
    /// The client that registered the session
    pub client: ClientUid,
    /// Application-chosen key scoping the session
    pub key: K,
}

impl<K> SessionId<K> {
    pub fn new(client: ClientUid, key: K) -> Self {
        Self { client, key }
    }
}

impl<K: fmt::Debug> fmt::Display for SessionId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.client, self.key)
    }
}

/// Returned from `register`, identifies one specific registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken<K> {
    pub id: SessionId<K>,
    pub generation: Generation,
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Registered and able to receive notifications
    Active,
    /// Torn down; terminal
    Invalidated,
}

/// Snapshot of a registered session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo<K> {
    pub id: SessionId<K>,
    pub generation: Generation,
    pub state: SessionState,
    pub registered_at: DateTime<Utc>,
}
