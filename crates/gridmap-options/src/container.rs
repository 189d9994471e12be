//! Option containers: mutable builder, immutable container.
//!
//! [`OptionsContainerBuilder`] accumulates option values during
//! configuration; [`OptionsContainer`] is the immutable, share-freely result.
//! Internally both key per-option-type state by [`TypeId`]; the state for a
//! type is selected at first use based on [`StoreOption::UNIQUE`] - a single
//! `(identifier, value)` slot for unique types, an identifier-keyed map for
//! non-unique ones.
//!
//! Scope hierarchies (global < entity < property) are not modeled here;
//! callers compose builders in priority order via [`OptionsContainerBuilder::add_all`],
//! most specific last, and build once per scope combination.
//!
//! # Example
//!
//! ```
//! use gridmap_options::{OptionsContainerBuilder, StoreOption};
//!
//! struct WriteConcern;
//! impl StoreOption for WriteConcern {
//!     type Identifier = ();
//!     type Value = String;
//!     const UNIQUE: bool = true;
//! }
//!
//! let mut global = OptionsContainerBuilder::new();
//! global.add::<WriteConcern>((), "ACKNOWLEDGED".into());
//!
//! let mut entity = OptionsContainerBuilder::new();
//! entity.add::<WriteConcern>((), "MAJORITY".into());
//!
//! // Most specific scope last: the entity-level setting wins.
//! let mut merged = OptionsContainerBuilder::new();
//! merged.add_all(&global);
//! merged.add_all(&entity);
//!
//! let options = merged.build();
//! assert_eq!(options.get_unique::<WriteConcern>().as_deref(), Some("MAJORITY"));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::option::StoreOption;

/// Type-erased per-option-type state.
///
/// Exactly one implementation exists per container kind; which one backs a
/// given option type is fixed at first `add` by [`StoreOption::UNIQUE`].
trait OptionState: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn OptionState>;
    /// Merges `other` (same option type, same container kind) into `self`,
    /// with `other` winning collisions.
    fn merge_from(&mut self, other: &dyn OptionState);
    fn type_name(&self) -> &'static str;
}

/// State for a unique option type: one `(identifier, value)` slot, later
/// registration wins wholesale.
struct UniqueState<O: StoreOption> {
    identifier: O::Identifier,
    value: O::Value,
}

impl<O: StoreOption> OptionState for UniqueState<O> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn OptionState> {
        Box::new(Self { identifier: self.identifier.clone(), value: self.value.clone() })
    }

    fn merge_from(&mut self, other: &dyn OptionState) {
        let other = other
            .as_any()
            .downcast_ref::<Self>()
            .expect("unique option state merged with a different option type");
        self.identifier = other.identifier.clone();
        self.value = other.value.clone();
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<O>()
    }
}

/// State for a non-unique option type: an identifier-keyed value map.
struct NonUniqueState<O: StoreOption> {
    values: HashMap<O::Identifier, O::Value>,
}

impl<O: StoreOption> OptionState for NonUniqueState<O> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn OptionState> {
        Box::new(Self { values: self.values.clone() })
    }

    fn merge_from(&mut self, other: &dyn OptionState) {
        let other = other
            .as_any()
            .downcast_ref::<Self>()
            .expect("non-unique option state merged with a different option type");
        for (identifier, value) in &other.values {
            self.values.insert(identifier.clone(), value.clone());
        }
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<O>()
    }
}

/// Accumulates option values during configuration.
///
/// Not thread-safe by design: builders are confined to the configuration
/// phase. The built [`OptionsContainer`] is immutable and freely shareable.
#[derive(Default)]
pub struct OptionsContainerBuilder {
    states: HashMap<TypeId, Box<dyn OptionState>>,
}

impl OptionsContainerBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for option type `O`.
    ///
    /// For unique types the new value replaces any earlier one; for
    /// non-unique types the value is stored under `identifier`, replacing an
    /// earlier value for the same identifier.
    pub fn add<O: StoreOption>(&mut self, identifier: O::Identifier, value: O::Value) {
        let state = self.states.entry(TypeId::of::<O>()).or_insert_with(|| {
            if O::UNIQUE {
                Box::new(UniqueState::<O> { identifier: identifier.clone(), value: value.clone() })
            } else {
                Box::new(NonUniqueState::<O> { values: HashMap::new() })
            }
        });

        if O::UNIQUE {
            let state = state
                .as_any_mut()
                .downcast_mut::<UniqueState<O>>()
                .expect("option type registered with a different container kind");
            state.identifier = identifier;
            state.value = value;
        } else {
            let state = state
                .as_any_mut()
                .downcast_mut::<NonUniqueState<O>>()
                .expect("option type registered with a different container kind");
            state.values.insert(identifier, value);
        }
    }

    /// Merge all options accumulated in `other` into this builder.
    ///
    /// `other` wins collisions: for unique types its value replaces this
    /// builder's, for non-unique types its identifiers override matching
    /// ones here. Composing scope containers in priority order via repeated
    /// `add_all`, most specific last, yields the scoped resolution hierarchy.
    pub fn add_all(&mut self, other: &Self) {
        for (type_id, state) in &other.states {
            match self.states.get_mut(type_id) {
                Some(existing) => existing.merge_from(state.as_ref()),
                None => {
                    self.states.insert(*type_id, state.clone_boxed());
                }
            }
        }
    }

    /// Whether no options have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Build the immutable container.
    ///
    /// An empty builder yields the shared empty container.
    #[must_use]
    pub fn build(self) -> OptionsContainer {
        if self.states.is_empty() {
            return OptionsContainer::empty();
        }
        OptionsContainer { states: Arc::new(self.states) }
    }
}

impl fmt::Debug for OptionsContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.states.values().map(|state| state.type_name()))
            .finish()
    }
}

/// An immutable group of resolved options.
///
/// Built once at bootstrap (or once per scope combination), lives for the
/// process, and is safe for unrestricted concurrent reads. Cloning is cheap.
#[derive(Clone)]
pub struct OptionsContainer {
    states: Arc<HashMap<TypeId, Box<dyn OptionState>>>,
}

impl OptionsContainer {
    /// The shared empty container.
    #[must_use]
    pub fn empty() -> Self {
        static EMPTY: OnceLock<OptionsContainer> = OnceLock::new();
        EMPTY
            .get_or_init(|| OptionsContainer { states: Arc::new(HashMap::new()) })
            .clone()
    }

    /// Get the value stored for option type `O` under `identifier`.
    ///
    /// For unique types the identifier does not participate in the lookup;
    /// the single stored value is returned if present.
    #[must_use]
    pub fn get<O: StoreOption>(&self, identifier: &O::Identifier) -> Option<O::Value> {
        let state = self.states.get(&TypeId::of::<O>())?;
        if O::UNIQUE {
            let state = state
                .as_any()
                .downcast_ref::<UniqueState<O>>()
                .expect("option type registered with a different container kind");
            Some(state.value.clone())
        } else {
            let state = state
                .as_any()
                .downcast_ref::<NonUniqueState<O>>()
                .expect("option type registered with a different container kind");
            state.values.get(identifier).cloned()
        }
    }

    /// Get the single value stored for the unique option type `O`.
    ///
    /// # Panics
    ///
    /// Panics if `O` is not declared unique; calling this for a non-unique
    /// option type is a programming error.
    #[must_use]
    pub fn get_unique<O: StoreOption>(&self) -> Option<O::Value> {
        assert!(
            O::UNIQUE,
            "get_unique called for non-unique option type `{}`",
            std::any::type_name::<O>()
        );
        let state = self.states.get(&TypeId::of::<O>())?;
        let state = state
            .as_any()
            .downcast_ref::<UniqueState<O>>()
            .expect("option type registered with a different container kind");
        Some(state.value.clone())
    }

    /// Get every value stored for option type `O`, keyed by identifier.
    ///
    /// Never absent: an option type with no stored values yields an empty
    /// map. Unique types yield a single-entry map keyed by the identifier
    /// recorded at registration.
    #[must_use]
    pub fn get_all<O: StoreOption>(&self) -> HashMap<O::Identifier, O::Value> {
        let Some(state) = self.states.get(&TypeId::of::<O>()) else {
            return HashMap::new();
        };
        if O::UNIQUE {
            let state = state
                .as_any()
                .downcast_ref::<UniqueState<O>>()
                .expect("option type registered with a different container kind");
            HashMap::from([(state.identifier.clone(), state.value.clone())])
        } else {
            let state = state
                .as_any()
                .downcast_ref::<NonUniqueState<O>>()
                .expect("option type registered with a different container kind");
            state.values.clone()
        }
    }

    /// Number of option types with stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no options are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl fmt::Debug for OptionsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.states.values().map(|state| state.type_name()))
            .finish()
    }
}
