//! Wrapper around a store-native query.

use gridmap_core::EntityKeyMetadata;

/// A store-native query plus the metadata needed to materialize its results.
///
/// The query object itself is opaque to the core: a dialect picks whatever
/// representation its store works with (a string, a parsed statement, a
/// structured document) and the mapping engine passes it through untouched.
///
/// When the query is known to return exactly one mapped entity type, the
/// single-entity metadata guides result materialization; projection and
/// polymorphic queries leave it unset.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendQuery<T> {
    query: T,
    single_entity_metadata: Option<EntityKeyMetadata>,
}

impl<T> BackendQuery<T> {
    /// Wrap a query with no single-entity-type metadata.
    #[must_use]
    pub fn new(query: T) -> Self {
        Self { query, single_entity_metadata: None }
    }

    /// Wrap a query known to return a single mapped entity type.
    #[must_use]
    pub fn for_single_entity(query: T, metadata: EntityKeyMetadata) -> Self {
        Self { query, single_entity_metadata: Some(metadata) }
    }

    /// The store-native query object.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &T {
        &self.query
    }

    /// Metadata of the single entity type this query returns, if known.
    #[inline]
    #[must_use]
    pub fn single_entity_metadata(&self) -> Option<&EntityKeyMetadata> {
        self.single_entity_metadata.as_ref()
    }
}
