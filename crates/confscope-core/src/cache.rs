//! Read-through configuration cache with per-scope generation stamps
//!
//! Each scope (system, or one user) is cached as a single entry in the shared
//! cache backend under `Scope::cache_key()`. Entries carry the layer's epoch
//! and the scope's generation at the time the store was read; an entry whose
//! stamp does not match the current generation is never served. Invalidation
//! bumps the generation first and then deletes the backend key, so a fill
//! computed from a store read that raced a write can never become visible.
//!
//! Generations are plain atomics: readers and fills never wait on each other
//! or on an invalidation in progress.
//!
//! A failing backend degrades the layer to pass-through: reads go to the
//! store, and `status()` reports `Degraded` until the next successful call.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use confscope_types::cache_adapter::CacheAdapter;
use confscope_types::record::validate_key;
use confscope_types::store_adapter::ConfigStoreAdapter;

use crate::opts::ConfScopeOpts;
use crate::prelude::*;

/// Records of one scope, keyed by configuration key
pub type ConfigMap = BTreeMap<String, ConfigurationRecord>;

/// Generations are unique across all scopes and layers of the process, so a
/// slot evicted from the LRU and recreated never matches an older entry.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
	NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Current generation of a scope
type Slot = Arc<AtomicU64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
	/// Backend reachable, reads are served from cache
	Ready,
	/// Last backend call failed, reads pass through to the store
	Degraded,
	/// No cache backend configured
	Disabled,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
	epoch: Uuid,
	generation: u64,
	/// Full snapshot of the scope (as opposed to individually fetched keys)
	complete: bool,
	records: ConfigMap,
}

/// Outcome of looking up a scope's entry in the backend
enum Lookup {
	Hit(CacheEntry),
	Miss,
	/// Backend failed or timed out; the caller skips filling
	Unavailable,
}

/// Run a backend call bounded by `timeout`, mapping expiry to `BackendUnavailable`
pub(crate) async fn bounded<T, F>(timeout: Duration, backend: Backend, fut: F) -> ClResult<T>
where
	F: Future<Output = ClResult<T>>,
{
	match tokio::time::timeout(timeout, fut).await {
		Ok(res) => res,
		Err(_) => {
			warn!("{} call timed out after {:?}", backend, timeout);
			Err(Error::BackendUnavailable(backend))
		}
	}
}

/// Collapse a scope's records into a key map; later records (by `updated_at`) win
fn to_map(records: Vec<ConfigurationRecord>) -> ConfigMap {
	let mut map = ConfigMap::new();
	for record in records {
		match map.get(record.key.as_ref()) {
			Some(existing) if existing.updated_at > record.updated_at => {}
			_ => {
				map.insert(record.key.to_string(), record);
			}
		}
	}
	map
}

pub struct ConfigCache {
	store: Arc<dyn ConfigStoreAdapter>,
	backend: Option<Arc<dyn CacheAdapter>>,
	epoch: Uuid,
	slots: parking_lot::Mutex<LruCache<Scope, Slot>>,
	degraded: AtomicBool,
	ttl_secs: u64,
	timeout: Duration,
	retries: u32,
	backoff: Duration,
	strict: bool,
}

impl ConfigCache {
	pub fn new(
		store: Arc<dyn ConfigStoreAdapter>,
		backend: Option<Arc<dyn CacheAdapter>>,
		opts: &ConfScopeOpts,
	) -> Self {
		let backend = if opts.disable_cache { None } else { backend };
		let capacity = NonZeroUsize::new(opts.scope_capacity).unwrap_or(NonZeroUsize::MIN);

		Self {
			store,
			backend,
			epoch: Uuid::new_v4(),
			slots: parking_lot::Mutex::new(LruCache::new(capacity)),
			degraded: AtomicBool::new(false),
			ttl_secs: opts.cache_ttl_secs,
			timeout: opts.backend_timeout,
			retries: opts.invalidation_retries,
			backoff: opts.invalidation_backoff,
			strict: opts.strict_invalidation,
		}
	}

	pub fn status(&self) -> CacheStatus {
		if self.backend.is_none() {
			CacheStatus::Disabled
		} else if self.degraded.load(Ordering::Acquire) {
			CacheStatus::Degraded
		} else {
			CacheStatus::Ready
		}
	}

	/// Single record of a scope. Absent keys are only answered from a complete snapshot,
	/// otherwise every miss re-reads the store.
	pub async fn get_by_key(&self, scope: Scope, key: &str) -> ClResult<Option<ConfigurationRecord>> {
		validate_key("key", key)?;

		let slot = self.slot(scope);
		let generation = slot.load(Ordering::Acquire);

		let partial = match self.read_entry(scope, generation).await {
			Lookup::Hit(mut entry) => {
				if let Some(record) = entry.records.remove(key) {
					debug!("Configuration cache hit: {} {}", scope, key);
					return Ok(Some(record));
				}
				if entry.complete {
					debug!("Configuration cache hit: {} {} (absent)", scope, key);
					return Ok(None);
				}
				Some(entry)
			}
			Lookup::Miss => None,
			Lookup::Unavailable => {
				let records = self.list_key(scope, key).await?;
				return Ok(to_map(records).remove(key));
			}
		};

		debug!("Configuration cache miss: {} {}", scope, key);
		let Some(record) = to_map(self.list_key(scope, key).await?).remove(key) else {
			return Ok(None);
		};

		let mut entry = partial.unwrap_or_else(|| self.entry(generation, false, ConfigMap::new()));
		entry.records.insert(key.to_string(), record.clone());
		self.fill(scope, &slot, &entry).await;

		Ok(Some(record))
	}

	/// Full snapshot of a scope. An empty scope is cached as an empty snapshot.
	pub async fn get_all_for_owner(&self, scope: Scope) -> ClResult<ConfigMap> {
		let slot = self.slot(scope);
		let generation = slot.load(Ordering::Acquire);

		let lookup = self.read_entry(scope, generation).await;
		if let Lookup::Hit(entry) = &lookup {
			if entry.complete {
				debug!("Configuration cache hit: {} ({} records)", scope, entry.records.len());
				return Ok(entry.records.clone());
			}
		}

		debug!("Configuration cache miss: {}", scope);
		let records =
			bounded(self.timeout, Backend::Store, self.store.list_configurations(&scope.filter()))
				.await?;
		let map = to_map(records);

		if !matches!(lookup, Lookup::Unavailable) {
			self.fill(scope, &slot, &self.entry(generation, true, map.clone())).await;
		}

		Ok(map)
	}

	/// Evict a scope's entry.
	///
	/// The generation is bumped before the backend delete, so this layer stops
	/// serving the old entry even if the delete fails. If the delete cannot be
	/// confirmed after all retries the layer is marked degraded and, in strict
	/// mode, `BackendUnavailable(Cache)` is returned.
	pub async fn invalidate(&self, scope: Scope) -> ClResult<()> {
		let generation = next_generation();
		self.slot(scope).store(generation, Ordering::Release);

		let Some(backend) = &self.backend else {
			return Ok(());
		};

		let key = scope.cache_key();
		let mut backoff = self.backoff;
		for attempt in 0..=self.retries {
			match bounded(self.timeout, Backend::Cache, backend.delete(&key)).await {
				Ok(()) => {
					self.mark_ready();
					debug!("Invalidated {} (generation {})", scope, generation);
					return Ok(());
				}
				Err(err) => {
					warn!("Invalidation of {} failed (attempt {}): {}", scope, attempt + 1, err);
				}
			}
			if attempt < self.retries {
				tokio::time::sleep(backoff).await;
				backoff = backoff.saturating_mul(2);
			}
		}

		self.mark_degraded();
		if self.strict {
			Err(Error::BackendUnavailable(Backend::Cache))
		} else {
			warn!("Continuing with unconfirmed invalidation of {}", scope);
			Ok(())
		}
	}

	fn entry(&self, generation: u64, complete: bool, records: ConfigMap) -> CacheEntry {
		CacheEntry { epoch: self.epoch, generation, complete, records }
	}

	fn slot(&self, scope: Scope) -> Slot {
		let mut slots = self.slots.lock();
		if let Some(slot) = slots.get(&scope) {
			return Arc::clone(slot);
		}
		let slot = Arc::new(AtomicU64::new(next_generation()));
		slots.put(scope, Arc::clone(&slot));
		slot
	}

	async fn list_key(&self, scope: Scope, key: &str) -> ClResult<Vec<ConfigurationRecord>> {
		let opts = scope.filter().with_key(key);
		bounded(self.timeout, Backend::Store, self.store.list_configurations(&opts)).await
	}

	/// Fetch and decode the scope's entry, accepting it only with a matching stamp
	async fn read_entry(&self, scope: Scope, generation: u64) -> Lookup {
		let Some(backend) = &self.backend else {
			return Lookup::Unavailable;
		};

		let bytes = match bounded(self.timeout, Backend::Cache, backend.get(&scope.cache_key())).await
		{
			Ok(Some(bytes)) => {
				self.mark_ready();
				bytes
			}
			Ok(None) => {
				self.mark_ready();
				return Lookup::Miss;
			}
			Err(err) => {
				debug!("Cache read for {} failed: {}", scope, err);
				self.mark_degraded();
				return Lookup::Unavailable;
			}
		};

		match serde_json::from_slice::<CacheEntry>(&bytes) {
			Ok(entry) if entry.epoch == self.epoch && entry.generation == generation => {
				Lookup::Hit(entry)
			}
			Ok(_) => {
				debug!("Ignoring stale cache entry for {}", scope);
				Lookup::Miss
			}
			Err(err) => {
				warn!("Undecodable cache entry for {}: {}", scope, err);
				Lookup::Miss
			}
		}
	}

	/// Store `entry` unless the scope was invalidated since its generation was read.
	///
	/// A fill racing an invalidation may still land after the backend delete; its
	/// stamp no longer matches the slot, so it is never served and gets removed
	/// again here on a best effort basis.
	async fn fill(&self, scope: Scope, slot: &Slot, entry: &CacheEntry) {
		let Some(backend) = &self.backend else {
			return;
		};
		if slot.load(Ordering::Acquire) != entry.generation {
			debug!("Skipping fill of {}, invalidated meanwhile", scope);
			return;
		}

		let bytes = match serde_json::to_vec(entry) {
			Ok(bytes) => bytes,
			Err(err) => {
				warn!("Cannot encode cache entry for {}: {}", scope, err);
				return;
			}
		};

		let key = scope.cache_key();
		match bounded(self.timeout, Backend::Cache, backend.set(&key, &bytes, self.ttl_secs)).await {
			Ok(()) => self.mark_ready(),
			Err(err) => {
				debug!("Cache fill for {} failed: {}", scope, err);
				self.mark_degraded();
				return;
			}
		}

		if slot.load(Ordering::Acquire) != entry.generation {
			debug!("Fill of {} raced an invalidation, removing it", scope);
			if let Err(err) = bounded(self.timeout, Backend::Cache, backend.delete(&key)).await {
				debug!("Cleanup of stale fill for {} failed: {}", scope, err);
			}
		}
	}

	fn mark_degraded(&self) {
		if !self.degraded.swap(true, Ordering::AcqRel) {
			warn!("Configuration cache degraded, passing reads through to the store");
		}
	}

	fn mark_ready(&self) {
		if self.degraded.swap(false, Ordering::AcqRel) {
			info!("Configuration cache recovered");
		}
	}
}

impl std::fmt::Debug for ConfigCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfigCache")
			.field("epoch", &self.epoch)
			.field("status", &self.status())
			.field("ttl_secs", &self.ttl_secs)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(key: &str, updated_at: i64) -> ConfigurationRecord {
		ConfigurationRecord {
			id: Uuid::new_v4(),
			owner_user_id: None,
			key: key.into(),
			value: serde_json::json!(updated_at),
			context_key: "system".into(),
			context_id: Uuid::new_v4(),
			workplace_id: Uuid::new_v4(),
			flags: FlagSet::new(),
			created_at: Timestamp(0),
			updated_at: Timestamp(updated_at),
		}
	}

	#[test]
	fn test_to_map_latest_wins() {
		let map = to_map(vec![record("a", 1), record("b", 2), record("a", 3)]);
		assert_eq!(map.len(), 2);
		assert_eq!(map["a"].value, serde_json::json!(3));

		// order of the input does not matter
		let map = to_map(vec![record("a", 3), record("a", 1)]);
		assert_eq!(map["a"].value, serde_json::json!(3));
	}

	#[test]
	fn test_generations_are_unique() {
		let a = next_generation();
		let b = next_generation();
		assert!(b > a);
	}

	#[tokio::test]
	async fn test_bounded_times_out() {
		let res: ClResult<()> = bounded(Duration::from_millis(10), Backend::Store, async {
			tokio::time::sleep(Duration::from_secs(5)).await;
			Ok(())
		})
		.await;
		assert!(matches!(res, Err(Error::BackendUnavailable(Backend::Store))));
	}
}

// vim: ts=4
