//! Log query pipeline.
//!
//! `query` classifies and parses logic expressions, `compile` turns the
//! parsed tree into a boolean query, `filters` merges in the time-range
//! and level filters, and `engine` executes the result against a
//! document store.

pub mod compile;
pub mod engine;
pub mod filters;
pub mod query;
