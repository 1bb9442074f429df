//! Adapter for the shared key-value cache backend.
//!
//! Values are opaque bytes with a per-entry TTL. Any `Err` from these calls is
//! treated as the backend being unavailable.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait CacheAdapter: Debug + Send + Sync {
	async fn get(&self, key: &str) -> ClResult<Option<Vec<u8>>>;

	async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> ClResult<()>;

	/// Deleting a missing key succeeds
	async fn delete(&self, key: &str) -> ClResult<()>;
}

// vim: ts=4
