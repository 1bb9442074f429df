//! Shared types, adapter traits, and error types for confscope.
//!
//! Storage and cache adapters depend only on this crate, so they compile
//! independently of the services in `confscope-core`.

pub mod cache_adapter;
pub mod error;
pub mod flag;
pub mod prelude;
pub mod record;
pub mod store_adapter;
pub mod types;

// vim: ts=4
