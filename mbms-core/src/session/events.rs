//! Registry lifecycle events and eviction hooks

use serde::{Deserialize, Serialize};

use super::types::{Generation, SessionId};

/// Why a session was evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// The remote endpoint's death recipient fired
    RemoteDied,
    /// Forwarding a notification to the remote endpoint failed
    DeliveryFailed,
}

/// Events published by a registry as sessions come and go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent<K> {
    /// A new session became active
    Registered {
        id: SessionId<K>,
        generation: Generation,
    },
    /// A session was replaced by a newer registration for the same key
    Superseded {
        id: SessionId<K>,
        generation: Generation,
    },
    /// A session was torn down explicitly
    Invalidated {
        id: SessionId<K>,
        generation: Generation,
    },
    /// A session was removed after its remote failed
    Evicted {
        id: SessionId<K>,
        generation: Generation,
        reason: EvictionReason,
    },
}

impl<K> RegistryEvent<K> {
    /// The session this event is about
    pub fn session_id(&self) -> &SessionId<K> {
        match self {
            Self::Registered { id, .. }
            | Self::Superseded { id, .. }
            | Self::Invalidated { id, .. }
            | Self::Evicted { id, .. } => id,
        }
    }

    /// Generation of the session this event is about
    pub fn generation(&self) -> Generation {
        match self {
            Self::Registered { generation, .. }
            | Self::Superseded { generation, .. }
            | Self::Invalidated { generation, .. }
            | Self::Evicted { generation, .. } => *generation,
        }
    }
}

/// Receives sessions that ended because their remote failed
///
/// Called exactly once per evicted session, never for explicit
/// invalidation or supersession. Runs outside the registry lock, but may be
/// called from a transport thread, so keep it short.
pub trait EvictionHandler<K>: Send + Sync {
    fn on_eviction(&self, id: &SessionId<K>, reason: EvictionReason);
}

impl<K, F> EvictionHandler<K> for F
where
    F: Fn(&SessionId<K>, EvictionReason) + Send + Sync,
{
    fn on_eviction(&self, id: &SessionId<K>, reason: EvictionReason) {
        self(id, reason)
    }
}

/// Eviction handler that ignores every eviction
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreEvictions;

impl<K> EvictionHandler<K> for IgnoreEvictions {
    fn on_eviction(&self, _id: &SessionId<K>, _reason: EvictionReason) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn event_accessors_return_session_and_generation() {
        let event = RegistryEvent::Evicted {
            id: SessionId::new(5, 1),
            generation: 9,
            reason: EvictionReason::RemoteDied,
        };

        assert_eq!(event.session_id(), &SessionId::new(5, 1));
        assert_eq!(event.generation(), 9);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = RegistryEvent::Registered {
            id: SessionId::new(5, 1),
            generation: 0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"registered""#));
    }

    #[test]
    fn closure_acts_as_eviction_handler() {
        let seen = Mutex::new(Vec::new());
        let handler = |id: &SessionId<i32>, reason: EvictionReason| {
            seen.lock().unwrap().push((id.clone(), reason));
        };

        handler.on_eviction(&SessionId::new(1, 2), EvictionReason::DeliveryFailed);

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(SessionId::new(1, 2), EvictionReason::DeliveryFailed)]
        );
    }
}
