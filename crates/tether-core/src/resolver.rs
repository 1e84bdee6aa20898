//! Canonical type resolution for polymorphic endpoints.
//!
//! Applications with single-table-inheritance-style hierarchies want every
//! subtype row stored under one shared discriminator. The resolver collapses
//! an entity's lineage to that canonical name: a type sitting directly under
//! a recognized root keeps its own name, anything deeper resolves to the
//! ancestor immediately below the root.

use crate::config::ResolverConfig;
use crate::types::{Entity, EntityRef, TypeName};

/// Root base types recognized out of the box.
pub const DEFAULT_ROOT_TYPES: &[&str] = &["Record"];

/// Resolves entities to their canonical type identifier.
///
/// The root set is fixed at construction (defaults plus the configured
/// extras), keeping resolution deterministic and testable. Resolution never
/// fails: a lineage that never reaches a root resolves to its top-most entry.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    roots: Vec<String>,
}

impl TypeResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        let mut roots: Vec<String> = DEFAULT_ROOT_TYPES.iter().map(|s| s.to_string()).collect();
        for extra in &config.root_types {
            if !roots.contains(extra) {
                roots.push(extra.clone());
            }
        }
        Self { roots }
    }

    /// The full recognized root set (defaults + configured extras).
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Resolve an entity to its canonical type name.
    pub fn resolve(&self, entity: &dyn Entity) -> TypeName {
        self.resolve_lineage(entity.type_name(), &entity.lineage())
    }

    /// Resolve an entity to a tagged endpoint reference.
    pub fn entity_ref(&self, entity: &dyn Entity) -> EntityRef {
        EntityRef {
            kind: self.resolve(entity),
            id: entity.entity_id(),
        }
    }

    /// Resolve from a raw name + lineage, nearest supertype first.
    ///
    /// If the immediate supertype is a recognized root (or there is none),
    /// the entity's own name is authoritative. Otherwise the canonical name
    /// is the last ancestor before the first recognized root.
    pub fn resolve_lineage(&self, name: &str, lineage: &[&str]) -> TypeName {
        match lineage.first() {
            None => TypeName::from(name),
            Some(parent) if self.is_root(parent) => TypeName::from(name),
            Some(_) => {
                let mut base = lineage[0];
                for ancestor in &lineage[1..] {
                    if self.is_root(ancestor) {
                        break;
                    }
                    base = ancestor;
                }
                TypeName::from(base)
            }
        }
    }

    fn is_root(&self, name: &str) -> bool {
        self.roots.iter().any(|r| r == name)
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_child_of_root_keeps_own_name() {
        let resolver = TypeResolver::default();
        let resolved = resolver.resolve_lineage("User", &["Record"]);
        assert_eq!(resolved.as_str(), "User");
    }

    #[test]
    fn empty_lineage_keeps_own_name() {
        let resolver = TypeResolver::default();
        assert_eq!(resolver.resolve_lineage("User", &[]).as_str(), "User");
    }

    #[test]
    fn subtype_collapses_to_base() {
        let resolver = TypeResolver::default();
        let resolved = resolver.resolve_lineage("AdminUser", &["User", "Record"]);
        assert_eq!(resolved.as_str(), "User");
    }

    #[test]
    fn subtype_of_subtype_collapses_to_ancestor_under_root() {
        let resolver = TypeResolver::default();
        let resolved = resolver.resolve_lineage("SuperAdminUser", &["AdminUser", "User", "Record"]);
        assert_eq!(resolved.as_str(), "User");
    }

    #[test]
    fn configured_extra_root_is_recognized() {
        let config = ResolverConfig {
            root_types: vec!["ApplicationRecord".to_string()],
        };
        let resolver = TypeResolver::new(&config);

        // Immediate parent is the extra root, so the subtype name sticks.
        let resolved = resolver.resolve_lineage("Band", &["ApplicationRecord", "Record"]);
        assert_eq!(resolved.as_str(), "Band");

        // One level deeper collapses to the type under the extra root.
        let resolved = resolver.resolve_lineage("CoverBand", &["Band", "ApplicationRecord"]);
        assert_eq!(resolved.as_str(), "Band");
    }

    #[test]
    fn lineage_without_root_resolves_to_top_most_ancestor() {
        let resolver = TypeResolver::default();
        let resolved = resolver.resolve_lineage("C", &["B", "A"]);
        assert_eq!(resolved.as_str(), "A");
    }

    #[test]
    fn extras_do_not_duplicate_defaults() {
        let config = ResolverConfig {
            root_types: vec!["Record".to_string()],
        };
        let resolver = TypeResolver::new(&config);
        assert_eq!(resolver.roots().len(), DEFAULT_ROOT_TYPES.len());
    }
}
