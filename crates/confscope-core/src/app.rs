//! Builder - wires the store, the cache backend and the options into a `ConfigService`

use std::sync::Arc;

use confscope_types::cache_adapter::CacheAdapter;
use confscope_types::store_adapter::ConfigStoreAdapter;

use crate::opts::ConfScopeOpts;
use crate::prelude::*;
use crate::service::ConfigService;

/// Install the fmt subscriber filtered by `RUST_LOG`. Does nothing if a
/// subscriber is already installed.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
}

pub struct ConfScopeBuilder {
	opts: ConfScopeOpts,
	store: Option<Arc<dyn ConfigStoreAdapter>>,
	cache_adapter: Option<Arc<dyn CacheAdapter>>,
}

impl ConfScopeBuilder {
	pub fn new() -> Self {
		init_tracing();
		ConfScopeBuilder { opts: ConfScopeOpts::default(), store: None, cache_adapter: None }
	}

	// Opts
	pub fn opts(&mut self, opts: ConfScopeOpts) -> &mut Self {
		self.opts = opts;
		self
	}
	pub fn cache_ttl_secs(&mut self, ttl_secs: u64) -> &mut Self {
		self.opts.cache_ttl_secs = ttl_secs;
		self
	}
	pub fn backend_timeout(&mut self, timeout: std::time::Duration) -> &mut Self {
		self.opts.backend_timeout = timeout;
		self
	}
	pub fn strict_invalidation(&mut self, strict: bool) -> &mut Self {
		self.opts.strict_invalidation = strict;
		self
	}
	pub fn disable_cache(&mut self, disable: bool) -> &mut Self {
		self.opts.disable_cache = disable;
		self
	}

	// Adapters
	pub fn store(&mut self, store: Arc<dyn ConfigStoreAdapter>) -> &mut Self {
		self.store = Some(store);
		self
	}
	pub fn cache_adapter(&mut self, cache_adapter: Arc<dyn CacheAdapter>) -> &mut Self {
		self.cache_adapter = Some(cache_adapter);
		self
	}

	pub fn build(&mut self) -> ClResult<ConfigService> {
		self.opts.validate()?;
		let store = self
			.store
			.clone()
			.ok_or_else(|| Error::ConfigError("No configuration store adapter".into()))?;

		if self.cache_adapter.is_none() && !self.opts.disable_cache {
			warn!("No cache adapter configured, configuration reads go straight to the store");
		}
		info!(
			"Configuration service ready (ttl={}s, timeout={:?}, strict_invalidation={})",
			self.opts.cache_ttl_secs, self.opts.backend_timeout, self.opts.strict_invalidation
		);

		Ok(ConfigService::new(store, self.cache_adapter.clone(), &self.opts))
	}
}

impl Default for ConfScopeBuilder {
	fn default() -> Self {
		Self::new()
	}
}


// vim: ts=4
