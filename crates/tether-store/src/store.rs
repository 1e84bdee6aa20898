//! Follow edge storage — trait + in-memory reference implementation.
//!
//! Backends must keep at most one edge per (followable, follower) pair.
//! The engine's block/follow paths are check-then-act, so without that
//! constraint two concurrent callers can both observe "no edge" and insert
//! duplicates. [`MemoryFollowStore`] enforces the pair under its write lock;
//! relational or graph backends are expected to use a uniqueness constraint
//! with conflict-as-update semantics.

use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

use tether_core::{EntityRef, Follow, FollowId};

use crate::query::{FollowField, FollowQuery, OrderBy, SortDirection};

/// Errors from follow storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Follow not found: {0}")]
    NotFound(FollowId),

    #[error("Duplicate edge: {follower} already has an edge to {followable}")]
    DuplicateEdge {
        followable: EntityRef,
        follower: EntityRef,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failures (connectivity, driver errors) pass through
    /// unchanged; this layer neither retries nor suppresses them.
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Trait for follow edge persistence backends.
pub trait FollowStore: Send + Sync {
    /// Persist a new edge. Fails with [`StoreError::DuplicateEdge`] if the
    /// (followable, follower) pair already has one.
    fn insert(&self, follow: &Follow) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Flip the blocked flag on an existing edge.
    fn set_blocked(
        &self,
        id: FollowId,
        blocked: bool,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete an edge by id. Returns whether a row was removed; a missing
    /// row is not an error.
    fn delete(&self, id: FollowId) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Execute a query specification: conjunctive filters, then order,
    /// then limit.
    fn query(
        &self,
        query: &FollowQuery,
    ) -> impl std::future::Future<Output = Result<Vec<Follow>, StoreError>> + Send;

    /// Count the rows the query would return.
    fn count(&self, query: &FollowQuery) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Delete every row matching the query's filters (order/limit ignored).
    /// Returns the number of rows removed.
    fn delete_matching(
        &self,
        query: &FollowQuery,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}

/// In-memory store backing tests and single-process embedding.
///
/// Rows live in insertion order behind an `RwLock`; queries without an
/// `order` return that insertion order, which keeps unordered-but-limited
/// queries deterministic within one process.
#[derive(Debug, Default)]
pub struct MemoryFollowStore {
    rows: RwLock<Vec<Follow>>,
}

impl MemoryFollowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Follow>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Follow>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FollowStore for MemoryFollowStore {
    async fn insert(&self, follow: &Follow) -> Result<(), StoreError> {
        let mut rows = self.write();
        if rows
            .iter()
            .any(|row| row.links(&follow.followable, &follow.follower))
        {
            return Err(StoreError::DuplicateEdge {
                followable: follow.followable.clone(),
                follower: follow.follower.clone(),
            });
        }
        tracing::debug!(follow_id = %follow.id, blocked = follow.blocked, "Edge inserted");
        rows.push(follow.clone());
        Ok(())
    }

    async fn set_blocked(&self, id: FollowId, blocked: bool) -> Result<(), StoreError> {
        let mut rows = self.write();
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.blocked = blocked;
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: FollowId) -> Result<bool, StoreError> {
        let mut rows = self.write();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }

    async fn query(&self, query: &FollowQuery) -> Result<Vec<Follow>, StoreError> {
        let rows = self.read();
        let mut results: Vec<Follow> = rows.iter().filter(|row| query.matches(row)).cloned().collect();

        if let Some(order) = query.order {
            results.sort_by(|a, b| compare(a, b, order));
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn count(&self, query: &FollowQuery) -> Result<u64, StoreError> {
        let rows = self.read();
        let matched = rows.iter().filter(|row| query.matches(row)).count();
        let capped = match query.limit {
            Some(limit) => matched.min(limit),
            None => matched,
        };
        Ok(capped as u64)
    }

    async fn delete_matching(&self, query: &FollowQuery) -> Result<u64, StoreError> {
        let mut rows = self.write();
        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        Ok((before - rows.len()) as u64)
    }
}

/// Typed comparison for sort specifications; string columns compare
/// lexicographically, `created_at` by instant, `blocked` false-before-true.
fn compare(a: &Follow, b: &Follow, order: OrderBy) -> Ordering {
    let ordering = match order.field {
        FollowField::Id => a.id.0.cmp(&b.id.0),
        FollowField::FollowableKind => a.followable.kind.as_str().cmp(b.followable.kind.as_str()),
        FollowField::FollowableId => a.followable.id.0.cmp(&b.followable.id.0),
        FollowField::FollowerKind => a.follower.kind.as_str().cmp(b.follower.kind.as_str()),
        FollowField::FollowerId => a.follower.id.0.cmp(&b.follower.id.0),
        FollowField::Blocked => a.blocked.cmp(&b.blocked),
        FollowField::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    match order.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FieldFilter, QueryOptions};
    use tether_core::EntityId;

    fn pair() -> (EntityRef, EntityRef) {
        (
            EntityRef::new("Band", EntityId::new()),
            EntityRef::new("User", EntityId::new()),
        )
    }

    #[tokio::test]
    async fn insert_and_query_round_trip() {
        let store = MemoryFollowStore::new();
        let (band, user) = pair();
        let follow = Follow::new(band.clone(), user.clone(), false);
        store.insert(&follow).await.unwrap();

        let results = store
            .query(&FollowQuery::new().for_followable(band))
            .await
            .unwrap();
        assert_eq!(results, vec![follow]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_pair() {
        let store = MemoryFollowStore::new();
        let (band, user) = pair();
        store
            .insert(&Follow::new(band.clone(), user.clone(), false))
            .await
            .unwrap();

        let duplicate = Follow::new(band, user, true);
        let result = store.insert(&duplicate).await;
        assert!(matches!(result, Err(StoreError::DuplicateEdge { .. })));
    }

    #[tokio::test]
    async fn set_blocked_flips_flag() {
        let store = MemoryFollowStore::new();
        let (band, user) = pair();
        let follow = Follow::new(band.clone(), user, false);
        store.insert(&follow).await.unwrap();

        store.set_blocked(follow.id, true).await.unwrap();
        let results = store
            .query(&FollowQuery::new().for_followable(band).blocked_only())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].blocked);
    }

    #[tokio::test]
    async fn set_blocked_on_missing_row_is_not_found() {
        let store = MemoryFollowStore::new();
        let result = store.set_blocked(FollowId::new(), true).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let store = MemoryFollowStore::new();
        let (band, user) = pair();
        let follow = Follow::new(band, user, false);
        store.insert(&follow).await.unwrap();

        assert!(store.delete(follow.id).await.unwrap());
        assert!(!store.delete(follow.id).await.unwrap());
    }

    #[tokio::test]
    async fn limit_without_order_returns_insertion_order() {
        let store = MemoryFollowStore::new();
        let band = EntityRef::new("Band", EntityId::new());
        let mut inserted = Vec::new();
        for _ in 0..3 {
            let follow = Follow::new(band.clone(), EntityRef::new("User", EntityId::new()), false);
            store.insert(&follow).await.unwrap();
            inserted.push(follow);
        }

        let query = FollowQuery::new().for_followable(band).with_limit(1);
        let first = store.query(&query).await.unwrap();
        let second = store.query(&query).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0], inserted[0]);
    }

    #[tokio::test]
    async fn order_applies_before_limit() {
        let store = MemoryFollowStore::new();
        let band = EntityRef::new("Band", EntityId::new());
        for _ in 0..3 {
            store
                .insert(&Follow::new(
                    band.clone(),
                    EntityRef::new("User", EntityId::new()),
                    false,
                ))
                .await
                .unwrap();
        }

        let all = store
            .query(
                &FollowQuery::new()
                    .for_followable(band.clone())
                    .ordered_by(OrderBy::desc(FollowField::CreatedAt)),
            )
            .await
            .unwrap();

        let limited = store
            .query(
                &FollowQuery::new()
                    .for_followable(band)
                    .ordered_by(OrderBy::desc(FollowField::CreatedAt))
                    .with_limit(1),
            )
            .await
            .unwrap();

        assert_eq!(limited, vec![all[0].clone()]);
    }

    #[tokio::test]
    async fn count_matches_query_size() {
        let store = MemoryFollowStore::new();
        let band = EntityRef::new("Band", EntityId::new());
        for blocked in [false, false, true] {
            store
                .insert(&Follow::new(
                    band.clone(),
                    EntityRef::new("User", EntityId::new()),
                    blocked,
                ))
                .await
                .unwrap();
        }

        let unblocked = FollowQuery::new().for_followable(band.clone()).unblocked();
        assert_eq!(store.count(&unblocked).await.unwrap(), 2);
        assert_eq!(
            store.count(&unblocked.with_limit(1)).await.unwrap(),
            1
        );
        let blocked = FollowQuery::new().for_followable(band).blocked_only();
        assert_eq!(store.count(&blocked).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn where_option_filters_conjunctively() {
        let store = MemoryFollowStore::new();
        let band = EntityRef::new("Band", EntityId::new());
        store
            .insert(&Follow::new(
                band.clone(),
                EntityRef::new("User", EntityId::new()),
                false,
            ))
            .await
            .unwrap();
        store
            .insert(&Follow::new(
                band.clone(),
                EntityRef::new("Admin", EntityId::new()),
                false,
            ))
            .await
            .unwrap();

        let options =
            QueryOptions::new().filter(FieldFilter::new(FollowField::FollowerKind, "Admin"));
        let query = options.apply(&FollowQuery::new().for_followable(band).unblocked());
        let results = store.query(&query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].follower.kind.as_str(), "Admin");
    }

    #[tokio::test]
    async fn delete_matching_removes_all_matches() {
        let store = MemoryFollowStore::new();
        let (band, user) = pair();
        // user follows band, band follows user back
        store
            .insert(&Follow::new(band.clone(), user.clone(), false))
            .await
            .unwrap();
        store
            .insert(&Follow::new(user.clone(), band.clone(), false))
            .await
            .unwrap();

        let removed = store
            .delete_matching(&FollowQuery::new().for_follower(user.clone()))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count(&FollowQuery::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn includes_hint_does_not_change_results() {
        let store = MemoryFollowStore::new();
        let (band, user) = pair();
        store
            .insert(&Follow::new(band.clone(), user, false))
            .await
            .unwrap();

        let plain = FollowQuery::new().for_followable(band.clone());
        let hinted = QueryOptions::new().include("follower").apply(&plain);
        assert_eq!(
            store.query(&plain).await.unwrap(),
            store.query(&hinted).await.unwrap()
        );
    }
}
