//! `FollowStore` implementation over Neo4j.
//!
//! Data shape:
//! ```text
//! (follower:Entity {kind, id})-[r:FOLLOWS {id, blocked, created_at}]->(followable:Entity {kind, id})
//! ```
//! `insert` MERGEs the relationship on the endpoint pair, so at most one
//! edge can ever exist per (followable, follower) even under concurrent
//! writers; a lost merge race surfaces as `DuplicateEdge` instead of a
//! second row.

use chrono::{DateTime, Utc};
use neo4rs::{query, Query};
use serde_json::Value;
use uuid::Uuid;

use tether_core::{EntityId, EntityRef, Follow, FollowId};
use tether_store::{FollowField, FollowQuery, FollowStore, SortDirection, StoreError};

use crate::client::{GraphClient, GraphError};

impl From<GraphError> for StoreError {
    fn from(err: GraphError) -> Self {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

/// Neo4j-backed follow store.
#[derive(Clone)]
pub struct GraphFollowStore {
    client: GraphClient,
}

impl GraphFollowStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

impl FollowStore for GraphFollowStore {
    async fn insert(&self, follow: &Follow) -> Result<(), StoreError> {
        let q = query(
            "MERGE (f:Entity {kind: $follower_kind, id: $follower_id})
             MERGE (t:Entity {kind: $followable_kind, id: $followable_id})
             MERGE (f)-[r:FOLLOWS]->(t)
             ON CREATE SET
               r.id = $id, r.blocked = $blocked, r.created_at = $created_at
             RETURN r.id AS id",
        )
        .param("follower_kind", follow.follower.kind.to_string())
        .param("follower_id", follow.follower.id.to_string())
        .param("followable_kind", follow.followable.kind.to_string())
        .param("followable_id", follow.followable.id.to_string())
        .param("id", follow.id.to_string())
        .param("blocked", follow.blocked)
        .param("created_at", follow.created_at.to_rfc3339());

        let row = self.client.query_one(q).await?;
        let stored_id = row
            .and_then(|r| r.get::<String>("id").ok())
            .unwrap_or_default();

        // MERGE matched a pre-existing relationship for this pair.
        if stored_id != follow.id.to_string() {
            return Err(StoreError::DuplicateEdge {
                followable: follow.followable.clone(),
                follower: follow.follower.clone(),
            });
        }

        tracing::debug!(follow_id = %follow.id, blocked = follow.blocked, "Edge inserted");
        Ok(())
    }

    async fn set_blocked(&self, id: FollowId, blocked: bool) -> Result<(), StoreError> {
        let q = query(
            "MATCH (:Entity)-[r:FOLLOWS {id: $id}]->(:Entity)
             SET r.blocked = $blocked
             RETURN count(r) AS cnt",
        )
        .param("id", id.to_string())
        .param("blocked", blocked);

        match self.client.query_one(q).await? {
            Some(row) if row.get::<i64>("cnt").unwrap_or(0) > 0 => Ok(()),
            _ => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: FollowId) -> Result<bool, StoreError> {
        let q = query(
            "MATCH (:Entity)-[r:FOLLOWS {id: $id}]->(:Entity)
             DELETE r
             RETURN count(r) AS cnt",
        )
        .param("id", id.to_string());

        match self.client.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0) > 0),
            None => Ok(false),
        }
    }

    async fn query(&self, spec: &FollowQuery) -> Result<Vec<Follow>, StoreError> {
        let (where_clause, params) = compile_filters(spec);
        let mut cypher = format!(
            "MATCH (f:Entity)-[r:FOLLOWS]->(t:Entity){where_clause}
             RETURN r.id AS id, r.blocked AS blocked, r.created_at AS created_at,
                    f.kind AS follower_kind, f.id AS follower_id,
                    t.kind AS followable_kind, t.id AS followable_id"
        );
        if let Some(order) = spec.order {
            let dir = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            cypher.push_str(&format!(" ORDER BY {} {dir}", field_expr(order.field)));
        }
        if spec.limit.is_some() {
            cypher.push_str(" LIMIT $limit");
        }

        let mut q = bind_params(query(&cypher), &params);
        if let Some(limit) = spec.limit {
            q = q.param("limit", limit as i64);
        }

        let rows = self.client.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(row_to_follow(&row)?);
        }
        Ok(results)
    }

    async fn count(&self, spec: &FollowQuery) -> Result<u64, StoreError> {
        let (where_clause, params) = compile_filters(spec);
        let cypher = format!(
            "MATCH (f:Entity)-[r:FOLLOWS]->(t:Entity){where_clause}
             RETURN count(r) AS cnt"
        );

        let q = bind_params(query(&cypher), &params);
        let counted = match self.client.query_one(q).await? {
            Some(row) => row.get::<i64>("cnt").unwrap_or(0).max(0) as u64,
            None => 0,
        };
        Ok(match spec.limit {
            Some(limit) => counted.min(limit as u64),
            None => counted,
        })
    }

    async fn delete_matching(&self, spec: &FollowQuery) -> Result<u64, StoreError> {
        let (where_clause, params) = compile_filters(spec);
        let cypher = format!(
            "MATCH (f:Entity)-[r:FOLLOWS]->(t:Entity){where_clause}
             DELETE r
             RETURN count(r) AS cnt"
        );

        let q = bind_params(query(&cypher), &params);
        match self.client.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0).max(0) as u64),
            None => Ok(0),
        }
    }
}

// ── Cypher compilation ────────────────────────────────────────────

/// The Cypher property expression for an edge column, within the
/// `(f)-[r:FOLLOWS]->(t)` pattern.
fn field_expr(field: FollowField) -> &'static str {
    match field {
        FollowField::Id => "r.id",
        FollowField::FollowableKind => "t.kind",
        FollowField::FollowableId => "t.id",
        FollowField::FollowerKind => "f.kind",
        FollowField::FollowerId => "f.id",
        FollowField::Blocked => "r.blocked",
        FollowField::CreatedAt => "r.created_at",
    }
}

/// Compile the conjunctive filters of a query into a `WHERE` clause plus
/// positional parameters. Order and limit are handled by the caller;
/// includes/joins hints have no Cypher counterpart and are ignored.
fn compile_filters(spec: &FollowQuery) -> (String, Vec<(String, Value)>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<(String, Value)> = Vec::new();

    let mut push = |expr: &str, value: Value, params: &mut Vec<(String, Value)>| {
        let name = format!("p{}", params.len());
        params.push((name.clone(), value));
        format!("{expr} = ${name}")
    };

    if let Some(followable) = &spec.followable {
        clauses.push(push("t.kind", Value::String(followable.kind.to_string()), &mut params));
        clauses.push(push("t.id", Value::String(followable.id.to_string()), &mut params));
    }
    if let Some(kind) = &spec.followable_kind {
        clauses.push(push("t.kind", Value::String(kind.to_string()), &mut params));
    }
    if let Some(follower) = &spec.follower {
        clauses.push(push("f.kind", Value::String(follower.kind.to_string()), &mut params));
        clauses.push(push("f.id", Value::String(follower.id.to_string()), &mut params));
    }
    if let Some(kind) = &spec.follower_kind {
        clauses.push(push("f.kind", Value::String(kind.to_string()), &mut params));
    }
    if let Some(blocked) = spec.blocked {
        clauses.push(push("r.blocked", Value::Bool(blocked), &mut params));
    }
    for filter in &spec.filters {
        clauses.push(push(field_expr(filter.field), filter.value.clone(), &mut params));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

/// Bind JSON parameter values with their native Bolt types.
fn bind_params(mut q: Query, params: &[(String, Value)]) -> Query {
    for (name, value) in params {
        q = match value {
            Value::Bool(b) => q.param(name.as_str(), *b),
            Value::Number(n) if n.is_i64() => q.param(name.as_str(), n.as_i64().unwrap_or_default()),
            Value::Number(n) => q.param(name.as_str(), n.as_f64().unwrap_or_default()),
            Value::String(s) => q.param(name.as_str(), s.clone()),
            other => q.param(name.as_str(), other.to_string()),
        };
    }
    q
}

// ── Row extraction ────────────────────────────────────────────────

fn row_to_follow(row: &neo4rs::Row) -> Result<Follow, GraphError> {
    let id = get_str(row, "id")?;
    let created_at = get_str(row, "created_at")?;
    let blocked: bool = row
        .get("blocked")
        .map_err(|e| GraphError::Serialization(format!("Failed to read blocked: {e}")))?;

    Ok(Follow {
        id: FollowId(parse_uuid(&id)?),
        followable: EntityRef::new(
            get_str(row, "followable_kind")?,
            EntityId(parse_uuid(&get_str(row, "followable_id")?)?),
        ),
        follower: EntityRef::new(
            get_str(row, "follower_kind")?,
            EntityId(parse_uuid(&get_str(row, "follower_id")?)?),
        ),
        blocked,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn get_str(row: &neo4rs::Row, key: &str) -> Result<String, GraphError> {
    row.get::<String>(key)
        .map_err(|e| GraphError::Serialization(format!("Failed to read {key}: {e}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid, GraphError> {
    Uuid::parse_str(raw).map_err(|e| GraphError::Serialization(format!("Invalid uuid {raw}: {e}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, GraphError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GraphError::Serialization(format!("Invalid timestamp {raw}: {e}")))
}
