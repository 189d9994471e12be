//! Scoped option resolution.
//!
//! Options are declared at three scopes - global, per entity, per property -
//! and a more specific scope overrides a less specific one. The containers
//! themselves know nothing about scopes; resolution is plain builder
//! composition in priority order, most specific last
//! (see [`OptionsContainerBuilder::add_all`]).
//!
//! [`ScopedOptions`] holds the per-scope builders accumulated during
//! configuration and materializes one immutable container per scope
//! combination on demand.
//!
//! # Example
//!
//! ```
//! use gridmap::scopes::ScopedOptions;
//! use gridmap_options::StoreOption;
//!
//! struct WriteConcern;
//! impl StoreOption for WriteConcern {
//!     type Identifier = ();
//!     type Value = String;
//!     const UNIQUE: bool = true;
//! }
//!
//! let mut scopes = ScopedOptions::new();
//! scopes.global_mut().add::<WriteConcern>((), "ACKNOWLEDGED".into());
//! scopes.entity_mut("User").add::<WriteConcern>((), "MAJORITY".into());
//!
//! // The entity-level setting shadows the global one for User...
//! let user = scopes.resolve_entity("User");
//! assert_eq!(user.get_unique::<WriteConcern>().as_deref(), Some("MAJORITY"));
//!
//! // ...while other entities fall back to the global default.
//! let order = scopes.resolve_entity("Order");
//! assert_eq!(order.get_unique::<WriteConcern>().as_deref(), Some("ACKNOWLEDGED"));
//! ```

use std::collections::HashMap;

use gridmap_options::{OptionsContainer, OptionsContainerBuilder};

/// Per-scope option builders, composed into containers on demand.
///
/// Confined to the configuration phase like the builders it holds; the
/// containers it produces are immutable and freely shareable.
#[derive(Debug, Default)]
pub struct ScopedOptions {
    global: OptionsContainerBuilder,
    entities: HashMap<String, OptionsContainerBuilder>,
    properties: HashMap<(String, String), OptionsContainerBuilder>,
}

impl ScopedOptions {
    /// Create an empty scope hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The global scope's builder.
    pub fn global_mut(&mut self) -> &mut OptionsContainerBuilder {
        &mut self.global
    }

    /// The builder for one entity's scope.
    pub fn entity_mut(&mut self, entity: impl Into<String>) -> &mut OptionsContainerBuilder {
        self.entities.entry(entity.into()).or_default()
    }

    /// The builder for one property's scope.
    pub fn property_mut(
        &mut self,
        entity: impl Into<String>,
        property: impl Into<String>,
    ) -> &mut OptionsContainerBuilder {
        self.properties.entry((entity.into(), property.into())).or_default()
    }

    /// The global options.
    #[must_use]
    pub fn resolve_global(&self) -> OptionsContainer {
        let mut merged = OptionsContainerBuilder::new();
        merged.add_all(&self.global);
        merged.build()
    }

    /// The options in effect for one entity: global overridden by the
    /// entity's scope.
    #[must_use]
    pub fn resolve_entity(&self, entity: &str) -> OptionsContainer {
        let mut merged = OptionsContainerBuilder::new();
        merged.add_all(&self.global);
        if let Some(builder) = self.entities.get(entity) {
            merged.add_all(builder);
        }
        merged.build()
    }

    /// The options in effect for one property: global, overridden by the
    /// entity's scope, overridden by the property's scope.
    #[must_use]
    pub fn resolve_property(&self, entity: &str, property: &str) -> OptionsContainer {
        let mut merged = OptionsContainerBuilder::new();
        merged.add_all(&self.global);
        if let Some(builder) = self.entities.get(entity) {
            merged.add_all(builder);
        }
        if let Some(builder) = self.properties.get(&(entity.to_owned(), property.to_owned())) {
            merged.add_all(builder);
        }
        merged.build()
    }
}

#[cfg(test)]
mod tests {
    use gridmap_options::StoreOption;

    use super::*;

    struct WriteConcern;
    impl StoreOption for WriteConcern {
        type Identifier = ();
        type Value = String;
        const UNIQUE: bool = true;
    }

    struct IndexedColumn;
    impl StoreOption for IndexedColumn {
        type Identifier = String;
        type Value = bool;
    }

    #[test]
    fn later_scope_wins_for_unique_options() {
        let mut scopes = ScopedOptions::new();
        scopes.global_mut().add::<WriteConcern>((), "A".into());
        scopes.entity_mut("User").add::<WriteConcern>((), "B".into());

        assert_eq!(scopes.resolve_global().get_unique::<WriteConcern>().as_deref(), Some("A"));
        assert_eq!(
            scopes.resolve_entity("User").get_unique::<WriteConcern>().as_deref(),
            Some("B")
        );
        assert_eq!(
            scopes.resolve_entity("Order").get_unique::<WriteConcern>().as_deref(),
            Some("A")
        );
    }

    #[test]
    fn property_scope_shadows_entity_and_global() {
        let mut scopes = ScopedOptions::new();
        scopes.global_mut().add::<WriteConcern>((), "A".into());
        scopes.entity_mut("User").add::<WriteConcern>((), "B".into());
        scopes.property_mut("User", "email").add::<WriteConcern>((), "C".into());

        let options = scopes.resolve_property("User", "email");
        assert_eq!(options.get_unique::<WriteConcern>().as_deref(), Some("C"));

        // Sibling properties only see the entity scope.
        let options = scopes.resolve_property("User", "name");
        assert_eq!(options.get_unique::<WriteConcern>().as_deref(), Some("B"));
    }

    #[test]
    fn non_unique_options_merge_identifier_wise_across_scopes() {
        let mut scopes = ScopedOptions::new();
        scopes.global_mut().add::<IndexedColumn>("id".into(), true);
        scopes.global_mut().add::<IndexedColumn>("name".into(), false);
        scopes.entity_mut("User").add::<IndexedColumn>("name".into(), true);

        let all = scopes.resolve_entity("User").get_all::<IndexedColumn>();
        assert_eq!(all.get("id"), Some(&true));
        assert_eq!(all.get("name"), Some(&true));
    }

    #[test]
    fn untouched_scopes_resolve_to_the_shared_empty_container() {
        let scopes = ScopedOptions::new();
        assert!(scopes.resolve_property("User", "email").is_empty());
    }
}
