//! Log search core for the registry administration service.
//!
//! Operators search structured application logs with a small boolean
//! expression language (`level:Error AND message:"timeout"`). Queries
//! are parsed, compiled into an Elasticsearch-style boolean query,
//! merged with time-range and level filters, and executed against a
//! document store.

pub mod cli;
pub mod error;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
