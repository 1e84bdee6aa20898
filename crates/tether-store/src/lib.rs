//! tether-store: Persistence contract for the Tether follow graph.
//!
//! This crate defines what a storage backend must provide — create, query,
//! and delete over follow edges — without tying the engine to any one
//! database. It ships:
//! - [`FollowQuery`]: an explicit query-specification object composed from
//!   discrete filter steps and executed once
//! - [`QueryOptions`]: the generic options bag (limit / includes / joins /
//!   where / order) and its deterministic application to a query
//! - [`FollowStore`]: the async storage trait
//! - [`MemoryFollowStore`]: the in-memory reference implementation

pub mod query;
pub mod store;

pub use query::{FieldFilter, FollowField, FollowQuery, OrderBy, QueryOptions, SortDirection};
pub use store::{FollowStore, MemoryFollowStore, StoreError};
