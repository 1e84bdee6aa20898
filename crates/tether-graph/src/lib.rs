//! Tether Graph — Neo4j-backed follow store.
//!
//! This crate is the durable backend for the follow graph. Endpoints are
//! `(:Entity {kind, id})` nodes and edges are `[:FOLLOWS]` relationships
//! carrying the blocked flag; pair uniqueness comes from `MERGE` on the
//! endpoint pair, which closes the check-then-act race the engine documents.

pub mod client;
pub mod store;

pub use client::{GraphClient, GraphError};
pub use store::GraphFollowStore;
