//! Option type declarations.
//!
//! An option is a typed (option type, identifier) → value association. Option
//! types are plain marker types implementing [`StoreOption`]; the trait's
//! associated types pin down the identifier and value shapes at compile time,
//! and [`StoreOption::UNIQUE`] declares whether at most one value may be
//! stored per type (later registration overrides earlier) or values
//! accumulate per identifier.
//!
//! # Example
//!
//! ```
//! use gridmap_options::StoreOption;
//!
//! /// At most one write concern per container; later settings win.
//! struct WriteConcern;
//!
//! impl StoreOption for WriteConcern {
//!     type Identifier = ();
//!     type Value = String;
//!     const UNIQUE: bool = true;
//! }
//!
//! /// One TTL per named cache region; values accumulate per region.
//! struct RegionTtl;
//!
//! impl StoreOption for RegionTtl {
//!     type Identifier = String;
//!     type Value = u64;
//! }
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// A declarable option type.
///
/// Implementors are marker types; the container never stores instances of
/// the implementor itself, only `(Identifier, Value)` pairs keyed by the
/// implementing type.
pub trait StoreOption: 'static {
    /// Discriminates values of a non-unique option type within the
    /// container. Unique option types conventionally use `()` or a
    /// descriptive label; their identifier is recorded but does not
    /// participate in lookups.
    type Identifier: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// The value stored for this option type.
    type Value: Clone + Debug + Send + Sync + 'static;

    /// Whether at most one value may be stored for this option type.
    ///
    /// Unique types follow last-registration-wins; non-unique types
    /// accumulate one value per identifier.
    const UNIQUE: bool = false;
}
