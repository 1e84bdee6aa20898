//! tether-engine: the follow relationship engine.
//!
//! This crate owns the relationship lifecycle over any [`FollowStore`]
//! backend:
//! - create / query / block / unblock operations on follow edges
//! - the per-pair state machine (no edge → active follow → blocked)
//! - materialization of follower entities through a type registry
//! - the dynamic per-type accessor convention
//!   (`user_followers`, `count_user_followers`, …)
//!
//! [`FollowStore`]: tether_store::FollowStore

pub mod accessor;
pub mod engine;
pub mod error;
pub mod registry;

pub use accessor::{AccessorKind, AccessorOutcome, FollowerAccessor};
pub use engine::FollowEngine;
pub use error::{EngineError, Result};
pub use registry::{EntityLoader, EntityRegistry};
