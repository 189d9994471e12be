//! Integration tests for GridMap.
//!
//! These tests exercise the full stack the way a mapping engine drives it:
//! tuples and associations mutated in a unit of work, writes queued and
//! flushed through the dialect wrappers, options resolved across scopes,
//! and native queries executed against the reference backend.

mod optimistic;
mod queries;
mod scoped_options;
mod unit_of_work;
