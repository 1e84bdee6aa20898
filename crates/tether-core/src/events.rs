//! Event types for relationship mutations.
//!
//! The engine emits one event per successful mutation so applications can
//! fan notifications out (feeds, counters, audit) without hooking the
//! storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{EntityRef, FollowId};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// An event emitted by the follow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEvent {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub payload: FollowEventPayload,
}

impl FollowEvent {
    pub fn new(payload: FollowEventPayload) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// The event payload, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum FollowEventPayload {
    /// A new active follow edge was created.
    FollowCreated {
        follow_id: FollowId,
        followable: EntityRef,
        follower: EntityRef,
    },
    /// An edge was blocked (created blocked, or an existing follow flipped).
    FollowBlocked {
        follow_id: FollowId,
        followable: EntityRef,
        follower: EntityRef,
        /// Whether a prior edge existed before the block.
        had_edge: bool,
    },
    /// An edge was deleted (unblock, or endpoint cascade).
    FollowRemoved {
        follow_id: FollowId,
        followable: EntityRef,
        follower: EntityRef,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    #[test]
    fn event_serialization_roundtrip() {
        let event = FollowEvent::new(FollowEventPayload::FollowCreated {
            follow_id: FollowId::new(),
            followable: EntityRef::new("Band", EntityId::new()),
            follower: EntityRef::new("User", EntityId::new()),
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: FollowEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, deserialized.id);
    }

    #[test]
    fn event_payload_tags() {
        let payload = FollowEventPayload::FollowBlocked {
            follow_id: FollowId::new(),
            followable: EntityRef::new("Band", EntityId::new()),
            follower: EntityRef::new("User", EntityId::new()),
            had_edge: true,
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"event_type\":\"FollowBlocked\""));
    }
}
