//! tether-core: Shared types, configuration, and error handling for Tether.
//!
//! Tether is a polymorphic follow-relationship graph: arbitrary entities of
//! possibly different kinds can follow, be followed by, and block one
//! another. This crate provides the foundation used by every other Tether
//! component:
//! - The `Follow` edge and its endpoint types
//! - The `Entity` capability trait application types implement
//! - The type resolver that collapses subtype hierarchies to a canonical name
//! - Event types emitted on relationship mutations
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod inflect;
pub mod resolver;
pub mod types;

pub use error::TetherError;
pub use resolver::TypeResolver;
pub use types::{Entity, EntityId, EntityRef, Follow, FollowId, TypeName};
