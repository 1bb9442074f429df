//! Builders for services and upsert requests

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use confscope_core::prelude::*;
use confscope_core::{ConfScopeOpts, ConfigService};
use confscope_types::cache_adapter::CacheAdapter;

use super::fakes::{FlakyCache, MemoryStore};

/// Context and workplace shared by the requests built here, so the same key
/// always maps to the same natural key.
pub const CONTEXT_ID: Uuid = Uuid::from_u128(0x1111);
pub const WORKPLACE_ID: Uuid = Uuid::from_u128(0x2222);

/// Options with short timeouts and backoff so failure tests stay fast
pub fn test_opts() -> ConfScopeOpts {
	ConfScopeOpts {
		backend_timeout: Duration::from_millis(200),
		invalidation_retries: 2,
		invalidation_backoff: Duration::from_millis(1),
		..ConfScopeOpts::default()
	}
}

pub struct TestService {
	pub service: ConfigService,
	pub store: Arc<MemoryStore>,
	pub cache: Arc<FlakyCache>,
}

pub fn create_test_service() -> TestService {
	create_test_service_with(test_opts())
}

pub fn create_test_service_with(opts: ConfScopeOpts) -> TestService {
	let store = MemoryStore::new();
	let cache = FlakyCache::new();
	let backend: Arc<dyn CacheAdapter> = cache.clone();
	let service = ConfigService::new(store.clone(), Some(backend), &opts);
	TestService { service, store, cache }
}

pub fn system_config(key: &str, value: Value, flags: &[Flag]) -> UpsertConfiguration {
	UpsertConfiguration {
		owner_user_id: None,
		key: key.into(),
		value,
		context_key: "system".into(),
		context_id: CONTEXT_ID,
		workplace_id: WORKPLACE_ID,
		flags: Some(flags.iter().copied().collect()),
	}
}

/// User-owned request without explicit flags
pub fn user_config(user_id: UserId, key: &str, value: Value) -> UpsertConfiguration {
	UpsertConfiguration {
		owner_user_id: Some(user_id),
		key: key.into(),
		value,
		context_key: format!("user_{}", user_id).into(),
		context_id: CONTEXT_ID,
		workplace_id: WORKPLACE_ID,
		flags: None,
	}
}

/// Context a user's own writes come from
pub fn user_context(user_id: UserId) -> Context {
	Context::Custom(format!("user_{}", user_id).into())
}

// vim: ts=4
