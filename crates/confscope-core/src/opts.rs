//! Runtime options

use std::time::Duration;

use crate::prelude::*;

/// TTL applied to every cached scope snapshot
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 2000;
const DEFAULT_INVALIDATION_RETRIES: u32 = 3;
const DEFAULT_INVALIDATION_BACKOFF_MS: u64 = 50;
const DEFAULT_SCOPE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfScopeOpts {
	pub cache_ttl_secs: u64,
	/// Upper bound for every single store or cache call
	pub backend_timeout: Duration,
	/// Extra delete attempts after a failed invalidation
	pub invalidation_retries: u32,
	/// Delay before the first retry, doubled on each further retry
	pub invalidation_backoff: Duration,
	/// Fail writes whose cache invalidation could not be confirmed
	pub strict_invalidation: bool,
	/// Number of scopes whose generation is tracked in memory
	pub scope_capacity: usize,
	pub disable_cache: bool,
}

impl Default for ConfScopeOpts {
	fn default() -> Self {
		Self {
			cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
			backend_timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
			invalidation_retries: DEFAULT_INVALIDATION_RETRIES,
			invalidation_backoff: Duration::from_millis(DEFAULT_INVALIDATION_BACKOFF_MS),
			strict_invalidation: true,
			scope_capacity: DEFAULT_SCOPE_CAPACITY,
			disable_cache: false,
		}
	}
}

impl ConfScopeOpts {
	/// Read options from `CONFSCOPE_*` environment variables
	pub fn from_env() -> ClResult<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Read options through an arbitrary variable lookup, unset variables keep their default
	pub fn from_lookup<F>(lookup: F) -> ClResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut opts = Self::default();

		if let Some(v) = lookup("CONFSCOPE_CACHE_TTL") {
			opts.cache_ttl_secs = parse_var("CONFSCOPE_CACHE_TTL", &v)?;
		}
		if let Some(v) = lookup("CONFSCOPE_BACKEND_TIMEOUT_MS") {
			opts.backend_timeout =
				Duration::from_millis(parse_var("CONFSCOPE_BACKEND_TIMEOUT_MS", &v)?);
		}
		if let Some(v) = lookup("CONFSCOPE_INVALIDATION_RETRIES") {
			opts.invalidation_retries = parse_var("CONFSCOPE_INVALIDATION_RETRIES", &v)?;
		}
		if let Some(v) = lookup("CONFSCOPE_INVALIDATION_BACKOFF_MS") {
			opts.invalidation_backoff =
				Duration::from_millis(parse_var("CONFSCOPE_INVALIDATION_BACKOFF_MS", &v)?);
		}
		if let Some(v) = lookup("CONFSCOPE_STRICT_INVALIDATION") {
			opts.strict_invalidation = parse_bool("CONFSCOPE_STRICT_INVALIDATION", &v)?;
		}
		if let Some(v) = lookup("CONFSCOPE_SCOPE_CAPACITY") {
			opts.scope_capacity = parse_var("CONFSCOPE_SCOPE_CAPACITY", &v)?;
		}
		if let Some(v) = lookup("CONFSCOPE_DISABLE_CACHE") {
			opts.disable_cache = parse_bool("CONFSCOPE_DISABLE_CACHE", &v)?;
		}

		opts.validate()?;
		Ok(opts)
	}

	pub fn validate(&self) -> ClResult<()> {
		if self.cache_ttl_secs == 0 {
			return Err(Error::ConfigError("cache TTL must be positive".into()));
		}
		if self.backend_timeout.is_zero() {
			return Err(Error::ConfigError("backend timeout must be positive".into()));
		}
		if self.scope_capacity == 0 {
			return Err(Error::ConfigError("scope capacity must be positive".into()));
		}
		Ok(())
	}
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> ClResult<T> {
	value
		.trim()
		.parse()
		.map_err(|_| Error::ConfigError(format!("{}: invalid value '{}'", name, value)))
}

fn parse_bool(name: &str, value: &str) -> ClResult<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(Error::ConfigError(format!("{}: invalid boolean '{}'", name, value))),
	}
}


// vim: ts=4
