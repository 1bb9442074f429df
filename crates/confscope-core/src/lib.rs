//! Scoped configuration access for confscope.
//!
//! - **Policy** (`policy.rs`): decides whether a write is allowed for its flags and calling context
//! - **Cache** (`cache.rs`): read-through, generation-stamped cache per scope
//! - **Service** (`service.rs`): `ConfigService`, the four access operations plus admin helpers
//! - **App** (`app.rs`): builder wiring store, cache backend and options together

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod cache;
pub mod fixtures;
pub mod opts;
pub mod policy;
pub mod prelude;
pub mod service;

pub use app::{ConfScopeBuilder, init_tracing};
pub use cache::{CacheStatus, ConfigCache, ConfigMap};
pub use opts::ConfScopeOpts;
pub use service::ConfigService;

// vim: ts=4
