//! GridMap Options
//!
//! This crate provides the option-resolution system: typed option
//! declarations and the container that stores resolved values.
//!
//! # Overview
//!
//! Stores and dialects expose tuning knobs as *option types* - marker types
//! implementing [`StoreOption`]. A [`OptionsContainerBuilder`] accumulates
//! values for any mix of option types during configuration and builds an
//! immutable [`OptionsContainer`] that is shared for the life of the process
//! and read from any number of units of work concurrently.
//!
//! Option types are either **unique** (at most one value; later registration
//! overrides earlier) or **non-unique** (values accumulate, one per
//! identifier). Scope hierarchies - global settings overridden per entity,
//! overridden again per property - fall out of merging builders in priority
//! order with [`OptionsContainerBuilder::add_all`], most specific last.
//!
//! # Example
//!
//! ```
//! use gridmap_options::{OptionsContainerBuilder, StoreOption};
//!
//! struct CacheEnabled;
//! impl StoreOption for CacheEnabled {
//!     type Identifier = ();
//!     type Value = bool;
//!     const UNIQUE: bool = true;
//! }
//!
//! let mut builder = OptionsContainerBuilder::new();
//! builder.add::<CacheEnabled>((), true);
//!
//! let options = builder.build();
//! assert_eq!(options.get_unique::<CacheEnabled>(), Some(true));
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

mod container;
mod option;

pub use container::{OptionsContainer, OptionsContainerBuilder};
pub use option::StoreOption;
