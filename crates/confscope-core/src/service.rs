//! Configuration access service
//!
//! Composes the mutation policy, the read-through cache and the store into the
//! operations exposed to callers. Writes invalidate the affected scope before
//! touching the store and again as their very last step, so the last writer to
//! complete always leaves the scope invalidated after its commit.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use confscope_types::cache_adapter::CacheAdapter;
use confscope_types::store_adapter::ConfigStoreAdapter;

use crate::cache::{CacheStatus, ConfigCache, ConfigMap, bounded};
use crate::opts::ConfScopeOpts;
use crate::policy;
use crate::prelude::*;

/// Main interface for reading and writing configuration records
#[derive(Debug)]
pub struct ConfigService {
	store: Arc<dyn ConfigStoreAdapter>,
	cache: ConfigCache,
	timeout: Duration,
}

impl ConfigService {
	pub fn new(
		store: Arc<dyn ConfigStoreAdapter>,
		cache_backend: Option<Arc<dyn CacheAdapter>>,
		opts: &ConfScopeOpts,
	) -> Self {
		let cache = ConfigCache::new(Arc::clone(&store), cache_backend, opts);
		Self { store, cache, timeout: opts.backend_timeout }
	}

	pub fn cache_status(&self) -> CacheStatus {
		self.cache.status()
	}

	/// Fetch one record of a scope by key; `None` if it does not exist
	pub async fn fetch_one(&self, scope: Scope, key: &str) -> ClResult<Option<ConfigurationRecord>> {
		self.cache.get_by_key(scope, key).await
	}

	/// Fetch every record of a scope, keyed by configuration key
	pub async fn fetch_scoped(&self, scope: Scope) -> ClResult<ConfigMap> {
		self.cache.get_all_for_owner(scope).await
	}

	/// Create or update a record from `context`.
	///
	/// Both the requested flags and, for updates, the flags already on the stored
	/// record must be writable from `context`; otherwise `PolicyViolation` is
	/// returned before anything is written.
	pub async fn upsert(
		&self,
		cfg: UpsertConfiguration,
		context: &Context,
	) -> ClResult<ConfigurationRecord> {
		cfg.validate()?;
		let natural_key = cfg.natural_key();
		let default_flags = cfg.default_flags();

		if let Some(flags) = &cfg.flags {
			policy::check_mutation(flags, context, &natural_key)?;
		}

		let existing = bounded(
			self.timeout,
			Backend::Store,
			self.store.find_configuration(&natural_key),
		)
		.await?;

		let now = Timestamp::now();
		let record = match existing {
			Some(existing) => {
				policy::check_mutation(&existing.flags, context, &natural_key)?;
				ConfigurationRecord {
					value: cfg.value,
					flags: cfg.flags.unwrap_or_else(|| existing.flags.clone()),
					updated_at: now,
					..existing
				}
			}
			None => ConfigurationRecord {
				id: Uuid::new_v4(),
				owner_user_id: cfg.owner_user_id,
				key: cfg.key,
				value: cfg.value,
				context_key: cfg.context_key,
				context_id: cfg.context_id,
				workplace_id: cfg.workplace_id,
				flags: cfg.flags.unwrap_or(default_flags),
				created_at: now,
				updated_at: now,
			},
		};

		let scope = record.scope();
		self.cache.invalidate(scope).await?;

		let saved =
			bounded(self.timeout, Backend::Store, self.store.save_configuration(&record)).await?;

		self.invalidate_committed(scope, &natural_key).await?;

		info!("Configuration {} saved from context '{}' (id={})", natural_key, context, saved.id);
		Ok(saved)
	}

	/// Delete a record. Deleting a record that no longer exists succeeds.
	pub async fn delete(&self, record: &ConfigurationRecord) -> ClResult<()> {
		let scope = record.scope();
		let natural_key = record.natural_key();

		self.cache.invalidate(scope).await?;

		let existed =
			bounded(self.timeout, Backend::Store, self.store.delete_configuration(record.id))
				.await?;

		self.invalidate_committed(scope, &natural_key).await?;

		if existed {
			info!("Configuration {} deleted (id={})", natural_key, record.id);
		} else {
			debug!("Configuration {} already absent (id={})", natural_key, record.id);
		}
		Ok(())
	}

	/// Delete a record by identifier; unknown identifiers succeed
	pub async fn delete_by_id(&self, id: Uuid) -> ClResult<()> {
		match self.fetch_by_id(id).await? {
			Some(record) => self.delete(&record).await,
			None => {
				debug!("Configuration id={} already absent", id);
				Ok(())
			}
		}
	}

	/// Read one record by identifier, bypassing the cache
	pub async fn fetch_by_id(&self, id: Uuid) -> ClResult<Option<ConfigurationRecord>> {
		bounded(self.timeout, Backend::Store, self.store.read_configuration(id)).await
	}

	/// List records matching a filter, bypassing the cache
	pub async fn find(&self, opts: &ListConfigurationOptions) -> ClResult<Vec<ConfigurationRecord>> {
		bounded(self.timeout, Backend::Store, self.store.list_configurations(opts)).await
	}

	/// Identifiers of the records matching a filter, oldest update first
	pub async fn ids(&self, opts: &ListConfigurationOptions) -> ClResult<Vec<Uuid>> {
		let records = self.find(opts).await?;
		Ok(records.into_iter().map(|record| record.id).collect())
	}

	/// Count records matching a filter, bypassing the cache
	pub async fn count(&self, opts: &ListConfigurationOptions) -> ClResult<u64> {
		bounded(self.timeout, Backend::Store, self.store.count_configurations(opts)).await
	}

	/// Post-commit invalidation. The store write already happened, so a failure
	/// here is reported as a failed operation rather than risking a stale read.
	async fn invalidate_committed(&self, scope: Scope, natural_key: &NaturalKey) -> ClResult<()> {
		self.cache.invalidate(scope).await.inspect_err(|err| {
			error!(
				"Configuration {} committed but invalidation of {} failed: {}",
				natural_key, scope, err
			);
		})
	}
}

// vim: ts=4
