//! Query specification and the options applier.
//!
//! Callers never chain implicit scopes against a connection; they build a
//! [`FollowQuery`] from discrete, order-independent filter steps and hand it
//! to the store once. [`QueryOptions`] is the generic options bag layered on
//! top: every recognized option merges into the query, absent options are
//! no-ops, and unknown keys in the bag form are ignored rather than errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tether_core::{EntityRef, Follow, TypeName};

// ── Fields and filters ────────────────────────────────────────────

/// The addressable columns of a follow edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FollowField {
    Id,
    FollowableKind,
    FollowableId,
    FollowerKind,
    FollowerId,
    Blocked,
    CreatedAt,
}

impl FollowField {
    /// Parse a column name from the options-bag form. Unknown names are
    /// `None` so callers can skip them.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "followable_kind" | "followable_type" => Some(Self::FollowableKind),
            "followable_id" => Some(Self::FollowableId),
            "follower_kind" | "follower_type" => Some(Self::FollowerKind),
            "follower_id" => Some(Self::FollowerId),
            "blocked" => Some(Self::Blocked),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FollowableKind => "followable_kind",
            Self::FollowableId => "followable_id",
            Self::FollowerKind => "follower_kind",
            Self::FollowerId => "follower_id",
            Self::Blocked => "blocked",
            Self::CreatedAt => "created_at",
        }
    }

    /// Extract this column from an edge as a JSON value, for generic
    /// predicate evaluation.
    pub fn value_of(&self, follow: &Follow) -> Value {
        match self {
            Self::Id => Value::String(follow.id.to_string()),
            Self::FollowableKind => Value::String(follow.followable.kind.to_string()),
            Self::FollowableId => Value::String(follow.followable.id.to_string()),
            Self::FollowerKind => Value::String(follow.follower.kind.to_string()),
            Self::FollowerId => Value::String(follow.follower.id.to_string()),
            Self::Blocked => Value::Bool(follow.blocked),
            Self::CreatedAt => Value::String(follow.created_at.to_rfc3339()),
        }
    }
}

/// One conjunctive equality predicate on an edge column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldFilter {
    pub field: FollowField,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: FollowField, value: impl Into<Value>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub fn matches(&self, follow: &Follow) -> bool {
        self.field.value_of(follow) == self.value
    }
}

// ── Ordering ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A sort specification. Without one, result order is unspecified (backends
/// return storage order) and callers must not rely on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderBy {
    pub field: FollowField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: FollowField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: FollowField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

// ── The query specification ───────────────────────────────────────

/// A filtered/ordered/limited query over follow edges.
///
/// All filters compose conjunctively. The builder steps are
/// order-independent; the store executes the finished specification once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowQuery {
    pub followable: Option<EntityRef>,
    pub followable_kind: Option<TypeName>,
    pub follower: Option<EntityRef>,
    pub follower_kind: Option<TypeName>,
    pub blocked: Option<bool>,
    /// Additional conjunctive predicates (from the `where` option).
    pub filters: Vec<FieldFilter>,
    /// Eager-load hint for backends that resolve endpoints; never changes
    /// result identity.
    pub includes: Vec<String>,
    /// Join-graph hint for relational backends.
    pub joins: Vec<String>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl FollowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edges pointing at the given followable.
    pub fn for_followable(mut self, followable: EntityRef) -> Self {
        self.followable = Some(followable);
        self
    }

    /// Edges originating from the given follower.
    pub fn for_follower(mut self, follower: EntityRef) -> Self {
        self.follower = Some(follower);
        self
    }

    /// Edges whose followable side has the given canonical kind.
    pub fn for_followable_kind(mut self, kind: impl Into<TypeName>) -> Self {
        self.followable_kind = Some(kind.into());
        self
    }

    /// Edges whose follower side has the given canonical kind.
    pub fn for_follower_kind(mut self, kind: impl Into<TypeName>) -> Self {
        self.follower_kind = Some(kind.into());
        self
    }

    /// Only active (non-blocked) edges.
    pub fn unblocked(mut self) -> Self {
        self.blocked = Some(false);
        self
    }

    /// Only blocked edges.
    pub fn blocked_only(mut self) -> Self {
        self.blocked = Some(true);
        self
    }

    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn ordered_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the conjunction of all filters against one edge.
    /// Order and limit are the store's concern, not this predicate's.
    pub fn matches(&self, follow: &Follow) -> bool {
        if let Some(followable) = &self.followable {
            if &follow.followable != followable {
                return false;
            }
        }
        if let Some(kind) = &self.followable_kind {
            if &follow.followable.kind != kind {
                return false;
            }
        }
        if let Some(follower) = &self.follower {
            if &follow.follower != follower {
                return false;
            }
        }
        if let Some(kind) = &self.follower_kind {
            if &follow.follower.kind != kind {
                return false;
            }
        }
        if let Some(blocked) = self.blocked {
            if follow.blocked != blocked {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(follow))
    }
}

// ── The options bag ───────────────────────────────────────────────

/// Caller-supplied query options: limit, includes, joins, where, order.
///
/// Applying the same options to the same base query is deterministic —
/// identical results, order, and size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub limit: Option<usize>,
    pub includes: Vec<String>,
    pub joins: Vec<String>,
    pub where_filters: Vec<FieldFilter>,
    pub order: Option<OrderBy>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include(mut self, association: impl Into<String>) -> Self {
        self.includes.push(association.into());
        self
    }

    pub fn join(mut self, association: impl Into<String>) -> Self {
        self.joins.push(association.into());
        self
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.where_filters.push(filter);
        self
    }

    pub fn ordered_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Merge these options into a base query. Present options are applied
    /// (limit, includes, joins, where, order); absent ones leave the base
    /// untouched. `where` composes conjunctively with the base filters.
    pub fn apply(&self, base: &FollowQuery) -> FollowQuery {
        let mut query = base.clone();
        if let Some(limit) = self.limit {
            query.limit = Some(limit);
        }
        if !self.includes.is_empty() {
            query.includes.extend(self.includes.iter().cloned());
        }
        if !self.joins.is_empty() {
            query.joins.extend(self.joins.iter().cloned());
        }
        if !self.where_filters.is_empty() {
            query.filters.extend(self.where_filters.iter().cloned());
        }
        if let Some(order) = self.order {
            query.order = Some(order);
        }
        query
    }

    /// Parse an options bag from loose JSON. Recognized keys: `limit`,
    /// `includes`, `joins`, `where`, `order`. Unknown keys — and unknown
    /// column names inside `where` — are ignored, not errors.
    pub fn from_json(value: &Value) -> Self {
        let mut options = Self::default();
        let Some(map) = value.as_object() else {
            return options;
        };

        if let Some(limit) = map.get("limit").and_then(Value::as_u64) {
            options.limit = Some(limit as usize);
        }
        options.includes = string_list(map.get("includes"));
        options.joins = string_list(map.get("joins"));

        if let Some(conditions) = map.get("where").and_then(Value::as_object) {
            for (name, value) in conditions {
                if let Some(field) = FollowField::parse(name) {
                    options.where_filters.push(FieldFilter {
                        field,
                        value: value.clone(),
                    });
                }
            }
        }

        if let Some(order) = map.get("order") {
            options.order = parse_order(order);
        }

        options
    }
}

/// Accept both `"assoc"` and `["a", "b"]` forms for includes/joins.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Accept `"created_at"`, `"created_at desc"`, or
/// `{"field": "...", "direction": "..."}`.
fn parse_order(value: &Value) -> Option<OrderBy> {
    match value {
        Value::String(spec) => {
            let mut parts = spec.split_whitespace();
            let field = FollowField::parse(parts.next()?)?;
            let direction = match parts.next() {
                Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                _ => SortDirection::Asc,
            };
            Some(OrderBy { field, direction })
        }
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}
