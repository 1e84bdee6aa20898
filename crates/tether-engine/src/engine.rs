//! The follow edge engine.
//!
//! All operations are phrased from the followable side: a followable X,
//! a candidate follower Y, or a canonical type token T. Endpoints arrive as
//! [`Entity`] capabilities and are normalized through the type resolver
//! before they touch storage.
//!
//! Per-pair state machine:
//! ```text
//! NoEdge ──follow──▶ ActiveFollow ──block──▶ Blocked
//!   │                                          │
//!   └────────────block────────────▶ Blocked ──unblock──▶ NoEdge
//! ```
//! There is no Blocked → ActiveFollow transition; restoring a follow takes
//! unblock (full deletion) and a fresh follow.

use tokio::sync::mpsc::UnboundedSender;

use tether_core::events::{FollowEvent, FollowEventPayload};
use tether_core::{Entity, Follow, TypeName, TypeResolver};
use tether_store::{FollowQuery, FollowStore, QueryOptions};

use crate::accessor::{self, AccessorKind, AccessorOutcome};
use crate::error::Result;
use crate::registry::EntityRegistry;

/// The relationship engine over a storage backend.
///
/// `E` is the application's entity representation (typically an enum over
/// its followable/follower types) produced by the registry's loaders.
pub struct FollowEngine<S, E> {
    store: S,
    resolver: TypeResolver,
    registry: EntityRegistry<E>,
    events: Option<UnboundedSender<FollowEvent>>,
}

impl<S: FollowStore, E> FollowEngine<S, E> {
    pub fn new(store: S, resolver: TypeResolver, registry: EntityRegistry<E>) -> Self {
        Self {
            store,
            resolver,
            registry,
            events: None,
        }
    }

    /// Send mutation events to the given channel. Receiver lag or a dropped
    /// receiver never fails the mutation.
    pub fn with_event_sink(mut self, sink: UnboundedSender<FollowEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &EntityRegistry<E> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry<E> {
        &mut self.registry
    }

    // ── Edge creation ────────────────────────────────────────────

    /// Record that `follower` follows `followable`.
    ///
    /// Idempotent: an existing edge for the pair is returned unchanged —
    /// including a blocked one, which a follow never reactivates.
    pub async fn follow(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<Follow> {
        if let Some(existing) = self.follow_for(followable, follower).await? {
            return Ok(existing);
        }

        let follow = Follow::new(
            self.resolver.entity_ref(followable),
            self.resolver.entity_ref(follower),
            false,
        );
        self.store.insert(&follow).await?;
        tracing::info!(
            followable = %follow.followable,
            follower = %follow.follower,
            "Follow created"
        );
        self.emit(FollowEventPayload::FollowCreated {
            follow_id: follow.id,
            followable: follow.followable.clone(),
            follower: follow.follower.clone(),
        });
        Ok(follow)
    }

    // ── Counts ───────────────────────────────────────────────────

    /// Number of active (non-blocked) followers of `followable`.
    pub async fn followers_count(&self, followable: &dyn Entity) -> Result<u64> {
        Ok(self
            .store
            .count(&self.followings_of(followable).unblocked())
            .await?)
    }

    /// Number of blocked followers of `followable`.
    pub async fn blocked_followers_count(&self, followable: &dyn Entity) -> Result<u64> {
        Ok(self
            .store
            .count(&self.followings_of(followable).blocked_only())
            .await?)
    }

    /// Alias for [`Self::blocked_followers_count`].
    pub async fn restricted_followers_count(&self, followable: &dyn Entity) -> Result<u64> {
        self.blocked_followers_count(followable).await
    }

    // ── Per-type queries ─────────────────────────────────────────

    /// Active follow rows for followers of the given canonical kind.
    /// Returns the relationship rows themselves so callers can keep
    /// composing; materialize through [`Self::followers`] when entities are
    /// wanted.
    pub async fn followers_by_type(
        &self,
        followable: &dyn Entity,
        kind: &TypeName,
        options: &QueryOptions,
    ) -> Result<Vec<Follow>> {
        let base = self
            .followings_of(followable)
            .unblocked()
            .for_follower_kind(kind.clone());
        Ok(self.store.query(&options.apply(&base)).await?)
    }

    /// Count of active followers of the given canonical kind.
    pub async fn followers_by_type_count(
        &self,
        followable: &dyn Entity,
        kind: &TypeName,
    ) -> Result<u64> {
        let query = self
            .followings_of(followable)
            .unblocked()
            .for_follower_kind(kind.clone());
        Ok(self.store.count(&query).await?)
    }

    // ── Materialized follower lists ──────────────────────────────

    /// Active follower entities of `followable`, options applied before
    /// materialization. Order is unspecified unless options carry one.
    pub async fn followers(&self, followable: &dyn Entity, options: &QueryOptions) -> Result<Vec<E>> {
        let base = self.followings_of(followable).unblocked();
        let edges = self.store.query(&options.apply(&base)).await?;
        self.materialize(edges)
    }

    /// Blocked follower entities of `followable`, same shape as
    /// [`Self::followers`].
    pub async fn restricts(&self, followable: &dyn Entity, options: &QueryOptions) -> Result<Vec<E>> {
        let base = self.followings_of(followable).blocked_only();
        let edges = self.store.query(&options.apply(&base)).await?;
        self.materialize(edges)
    }

    // ── Pairwise checks ──────────────────────────────────────────

    /// True iff an unblocked edge (followable, follower) exists.
    pub async fn followed_by(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<bool> {
        let query = self
            .followings_of(followable)
            .for_follower(self.resolver.entity_ref(follower))
            .unblocked();
        Ok(self.store.count(&query).await? > 0)
    }

    /// True iff `followable` has blocked `follower`.
    pub async fn restricted(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<bool> {
        let query = self
            .followings_of(followable)
            .for_follower(self.resolver.entity_ref(follower))
            .blocked_only();
        Ok(self.store.count(&query).await? > 0)
    }

    /// Symmetric check: true iff `other` has blocked `entity` — evaluated
    /// over `entity`'s outgoing edges.
    pub async fn restricted_by(&self, entity: &dyn Entity, other: &dyn Entity) -> Result<bool> {
        let query = FollowQuery::new()
            .for_follower(self.resolver.entity_ref(entity))
            .for_followable(self.resolver.entity_ref(other))
            .blocked_only();
        Ok(self.store.count(&query).await? > 0)
    }

    /// First edge for the pair, or `None`. Absence is a value here, never
    /// an error.
    pub async fn follow_for(
        &self,
        followable: &dyn Entity,
        follower: &dyn Entity,
    ) -> Result<Option<Follow>> {
        let query = self
            .followings_of(followable)
            .for_follower(self.resolver.entity_ref(follower))
            .with_limit(1);
        Ok(self.store.query(&query).await?.into_iter().next())
    }

    // ── Blocking ─────────────────────────────────────────────────

    /// Block `follower`: flip an existing edge to blocked, or create a new
    /// blocked edge recording a pre-emptive block. Idempotent once blocked.
    ///
    /// The read-then-write here is not atomic; the store contract's per-pair
    /// uniqueness is what keeps two racing blocks from creating duplicate
    /// rows.
    pub async fn block(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<Follow> {
        match self.follow_for(followable, follower).await? {
            Some(existing) if existing.blocked => Ok(existing),
            Some(mut existing) => {
                self.store.set_blocked(existing.id, true).await?;
                existing.blocked = true;
                tracing::info!(
                    followable = %existing.followable,
                    follower = %existing.follower,
                    "Existing follow blocked"
                );
                self.emit(FollowEventPayload::FollowBlocked {
                    follow_id: existing.id,
                    followable: existing.followable.clone(),
                    follower: existing.follower.clone(),
                    had_edge: true,
                });
                Ok(existing)
            }
            None => {
                let follow = Follow::new(
                    self.resolver.entity_ref(followable),
                    self.resolver.entity_ref(follower),
                    true,
                );
                self.store.insert(&follow).await?;
                tracing::info!(
                    followable = %follow.followable,
                    follower = %follow.follower,
                    "Future follow blocked"
                );
                self.emit(FollowEventPayload::FollowBlocked {
                    follow_id: follow.id,
                    followable: follow.followable.clone(),
                    follower: follow.follower.clone(),
                    had_edge: false,
                });
                Ok(follow)
            }
        }
    }

    /// Alias for [`Self::block`].
    pub async fn restrict(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<Follow> {
        self.block(followable, follower).await
    }

    /// Unblock `follower` by deleting the pair's edge entirely, whatever
    /// its state — a previously active follow is not restored. A missing
    /// edge is a no-op `false`.
    pub async fn unblock(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<bool> {
        match self.follow_for(followable, follower).await? {
            Some(existing) => {
                self.store.delete(existing.id).await?;
                tracing::info!(
                    followable = %existing.followable,
                    follower = %existing.follower,
                    "Follow removed"
                );
                self.emit(FollowEventPayload::FollowRemoved {
                    follow_id: existing.id,
                    followable: existing.followable,
                    follower: existing.follower,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Alias for [`Self::unblock`].
    pub async fn unrestrict(&self, followable: &dyn Entity, follower: &dyn Entity) -> Result<bool> {
        self.unblock(followable, follower).await
    }

    // ── Cascade ──────────────────────────────────────────────────

    /// Delete every edge referencing the entity, on either side. Called
    /// when the application destroys the entity itself.
    pub async fn purge_entity(&self, entity: &dyn Entity) -> Result<u64> {
        let entity_ref = self.resolver.entity_ref(entity);
        let incoming = self
            .store
            .delete_matching(&FollowQuery::new().for_followable(entity_ref.clone()))
            .await?;
        let outgoing = self
            .store
            .delete_matching(&FollowQuery::new().for_follower(entity_ref.clone()))
            .await?;
        let removed = incoming + outgoing;
        if removed > 0 {
            tracing::info!(entity = %entity_ref, removed, "Edges purged for destroyed entity");
        }
        Ok(removed)
    }

    // ── Dynamic accessors ────────────────────────────────────────

    /// Pure predicate: is `name` a per-type follower accessor this engine
    /// would handle?
    pub fn responds_to(&self, name: &str) -> bool {
        accessor::recognizes(name)
    }

    /// Resolve and delegate a free-form accessor name.
    ///
    /// `Ok(None)` means the name matches neither pattern — the caller
    /// should fall through to its normal resolution. A matching name whose
    /// type token doesn't canonicalize to a registered kind is an
    /// [`UnknownType`](crate::EngineError::UnknownType) error.
    pub async fn invoke_accessor(
        &self,
        followable: &dyn Entity,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Option<AccessorOutcome>> {
        let Some(parsed) = accessor::parse(name) else {
            return Ok(None);
        };

        let kind = TypeName::new(tether_core::inflect::canonical_type_token(&parsed.token));
        if !self.registry.contains(&kind) {
            return Err(crate::EngineError::UnknownType {
                kind: kind.to_string(),
            });
        }

        let outcome = match parsed.kind {
            AccessorKind::Followers => {
                AccessorOutcome::Rows(self.followers_by_type(followable, &kind, options).await?)
            }
            AccessorKind::FollowersCount => {
                AccessorOutcome::Count(self.followers_by_type_count(followable, &kind).await?)
            }
        };
        Ok(Some(outcome))
    }

    // ── Internals ────────────────────────────────────────────────

    /// Base query: edges pointing at the followable.
    fn followings_of(&self, followable: &dyn Entity) -> FollowQuery {
        FollowQuery::new().for_followable(self.resolver.entity_ref(followable))
    }

    /// Resolve each edge's follower through the registry. A registered
    /// loader returning `None` (endpoint deleted out-of-band) is skipped;
    /// an unregistered kind is an error.
    fn materialize(&self, edges: Vec<Follow>) -> Result<Vec<E>> {
        let mut entities = Vec::with_capacity(edges.len());
        for edge in edges {
            match self.registry.load(&edge.follower.kind, edge.follower.id)? {
                Some(entity) => entities.push(entity),
                None => {
                    tracing::warn!(
                        follower = %edge.follower,
                        follow_id = %edge.id,
                        "Follower entity missing during materialization; skipped"
                    );
                }
            }
        }
        Ok(entities)
    }

    fn emit(&self, payload: FollowEventPayload) {
        if let Some(sink) = &self.events {
            let _ = sink.send(FollowEvent::new(payload));
        }
    }
}
