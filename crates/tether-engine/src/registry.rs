//! Entity registry: canonical type identifiers back to concrete loaders.
//!
//! Edges only store a (kind, id) pair; turning a pair back into an
//! application entity needs a handler per canonical kind. The registry is
//! that lookup — it also defines which accessor type tokens count as
//! "known" (an unregistered kind is an error, never silently empty).

use std::collections::HashMap;

use tether_core::{EntityId, TypeName};

use crate::error::EngineError;

/// Loads one kind of application entity by id.
///
/// `None` means the id has no entity behind it anymore (deleted
/// out-of-band); that is not an error at this level.
pub trait EntityLoader<E>: Send + Sync {
    fn load(&self, id: EntityId) -> Option<E>;
}

impl<E, F> EntityLoader<E> for F
where
    F: Fn(EntityId) -> Option<E> + Send + Sync,
{
    fn load(&self, id: EntityId) -> Option<E> {
        self(id)
    }
}

/// Maps canonical type identifiers to entity loaders.
pub struct EntityRegistry<E> {
    loaders: HashMap<TypeName, Box<dyn EntityLoader<E>>>,
}

impl<E> EntityRegistry<E> {
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Register the loader for a canonical kind, replacing any previous one.
    pub fn register(
        &mut self,
        kind: impl Into<TypeName>,
        loader: impl EntityLoader<E> + 'static,
    ) -> &mut Self {
        self.loaders.insert(kind.into(), Box::new(loader));
        self
    }

    pub fn contains(&self, kind: &TypeName) -> bool {
        self.loaders.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &TypeName> {
        self.loaders.keys()
    }

    /// Load an entity by kind + id. An unregistered kind is an
    /// [`EngineError::UnknownType`].
    pub fn load(&self, kind: &TypeName, id: EntityId) -> Result<Option<E>, EngineError> {
        match self.loaders.get(kind) {
            Some(loader) => Ok(loader.load(id)),
            None => Err(EngineError::UnknownType {
                kind: kind.to_string(),
            }),
        }
    }
}

impl<E> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
