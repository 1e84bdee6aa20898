//! Core domain types for the Tether follow graph.
//!
//! The only persisted entity is the [`Follow`] edge: a directed relation
//! from a follower to a followable, with a `blocked` modifier. Endpoints are
//! polymorphic and stored as a (kind, id) pair rather than a typed reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identifiers ───────────────────────────────────────────────────

/// Unique identifier for an application entity taking part in the graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a follow edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FollowId(pub Uuid);

impl FollowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FollowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FollowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical type identifier used to store and query polymorphic endpoints.
///
/// Produced by the [`crate::TypeResolver`], which collapses subtype
/// hierarchies to one shared name, so edges written for `AdminUser` and
/// `User` rows land under the same discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Endpoints ─────────────────────────────────────────────────────

/// A tagged reference to one endpoint of a follow edge.
///
/// The edge never owns the entity it points at; ownership stays with the
/// application, and the reference is just the discriminator pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: TypeName,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: impl Into<TypeName>, id: EntityId) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

// ── The Follow edge ───────────────────────────────────────────────

/// The persisted record of a (followable, follower) relationship.
///
/// `blocked = false` is the only state counted as an active follow.
/// `blocked = true` covers both a pre-emptive block of a never-following
/// entity and a retroactively suppressed follow; the two are
/// indistinguishable on the row, there is no separate block record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Follow {
    pub id: FollowId,
    /// The entity being followed.
    pub followable: EntityRef,
    /// The entity doing the following (or being blocked).
    pub follower: EntityRef,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    pub fn new(followable: EntityRef, follower: EntityRef, blocked: bool) -> Self {
        Self {
            id: FollowId::new(),
            followable,
            follower,
            blocked,
            created_at: Utc::now(),
        }
    }

    /// True if this edge links the given followable/follower pair.
    pub fn links(&self, followable: &EntityRef, follower: &EntityRef) -> bool {
        &self.followable == followable && &self.follower == follower
    }

    /// True if this edge references the entity on either side.
    pub fn touches(&self, entity: &EntityRef) -> bool {
        &self.followable == entity || &self.follower == entity
    }
}

// ── Entity capability ─────────────────────────────────────────────

/// Capability implemented by application types that take part in the graph,
/// on either side of an edge.
///
/// Rather than mixing behavior into the application type's own namespace,
/// the engine takes this capability as a parameter: an entity only has to
/// say who it is and where it sits in its type hierarchy.
pub trait Entity {
    /// The entity's own identifier.
    fn entity_id(&self) -> EntityId;

    /// The entity's most-derived type name.
    fn type_name(&self) -> &'static str;

    /// Supertype chain, nearest first, ending at a root base type.
    ///
    /// The default (empty) lineage means the type sits directly under a
    /// root, so its own name is always canonical.
    fn lineage(&self) -> Vec<&'static str> {
        Vec::new()
    }
}
