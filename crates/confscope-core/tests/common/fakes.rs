//! In-memory stand-ins for the store and the cache backend
//!
//! Both count their calls so tests can tell a cache hit from a store read, and
//! both can be switched off to simulate an unreachable backend.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

use confscope_cache_adapter_memory::CacheAdapterMemory;
use confscope_core::prelude::*;
use confscope_types::cache_adapter::CacheAdapter;
use confscope_types::store_adapter::ConfigStoreAdapter;

/// Pauses an operation once it reached a given point until the test releases it
#[derive(Debug)]
pub struct Gate {
	entered: Notify,
	release: Semaphore,
}

impl Gate {
	pub fn new() -> Arc<Self> {
		Arc::new(Gate { entered: Notify::new(), release: Semaphore::new(0) })
	}

	/// Wait until an operation is parked at the gate
	pub async fn wait_entered(&self) {
		self.entered.notified().await;
	}

	pub fn release(&self) {
		self.release.add_permits(1);
	}

	async fn pass(&self) {
		self.entered.notify_one();
		if let Ok(permit) = self.release.acquire().await {
			permit.forget();
		}
	}
}

// MemoryStore //
//*************//
#[derive(Debug, Default)]
pub struct MemoryStore {
	records: parking_lot::Mutex<Vec<ConfigurationRecord>>,
	available: AtomicBool,
	delay: parking_lot::Mutex<Option<Duration>>,
	list_gate: parking_lot::Mutex<Option<Arc<Gate>>>,
	save_gate: parking_lot::Mutex<Option<Arc<Gate>>>,
	pub finds: AtomicUsize,
	pub lists: AtomicUsize,
	pub saves: AtomicUsize,
	pub deletes: AtomicUsize,
}

impl MemoryStore {
	pub fn new() -> Arc<Self> {
		let store = MemoryStore::default();
		store.available.store(true, Ordering::SeqCst);
		Arc::new(store)
	}

	pub fn set_available(&self, available: bool) {
		self.available.store(available, Ordering::SeqCst);
	}

	/// Delay every call, to exercise the backend timeout
	pub fn set_delay(&self, delay: Option<Duration>) {
		*self.delay.lock() = delay;
	}

	/// Park the next list call after it took its snapshot of the records
	pub fn gate_next_list(&self) -> Arc<Gate> {
		let gate = Gate::new();
		*self.list_gate.lock() = Some(Arc::clone(&gate));
		gate
	}

	/// Park the next save call before it writes
	pub fn gate_next_save(&self) -> Arc<Gate> {
		let gate = Gate::new();
		*self.save_gate.lock() = Some(Arc::clone(&gate));
		gate
	}

	pub fn records(&self) -> Vec<ConfigurationRecord> {
		self.records.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.records.lock().len()
	}

	pub fn list_calls(&self) -> usize {
		self.lists.load(Ordering::SeqCst)
	}

	pub fn save_calls(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}

	/// Insert a record directly, bypassing the service (and its invalidation)
	pub fn insert_raw(&self, record: ConfigurationRecord) {
		self.records.lock().push(record);
	}

	async fn enter(&self) -> ClResult<()> {
		let delay = *self.delay.lock();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if self.available.load(Ordering::SeqCst) {
			Ok(())
		} else {
			Err(Error::BackendUnavailable(Backend::Store))
		}
	}
}

#[async_trait]
impl ConfigStoreAdapter for MemoryStore {
	async fn read_configuration(&self, id: Uuid) -> ClResult<Option<ConfigurationRecord>> {
		self.enter().await?;
		Ok(self.records.lock().iter().find(|r| r.id == id).cloned())
	}

	async fn find_configuration(&self, key: &NaturalKey) -> ClResult<Option<ConfigurationRecord>> {
		self.finds.fetch_add(1, Ordering::SeqCst);
		self.enter().await?;
		Ok(self.records.lock().iter().find(|r| key.matches(r)).cloned())
	}

	async fn list_configurations(
		&self,
		opts: &ListConfigurationOptions,
	) -> ClResult<Vec<ConfigurationRecord>> {
		self.lists.fetch_add(1, Ordering::SeqCst);
		self.enter().await?;

		let mut rows: Vec<ConfigurationRecord> =
			self.records.lock().iter().filter(|r| opts.matches(r)).cloned().collect();
		rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
		if let Some(limit) = opts.limit {
			rows.truncate(limit as usize);
		}

		let gate = self.list_gate.lock().take();
		if let Some(gate) = gate {
			gate.pass().await;
		}
		Ok(rows)
	}

	async fn count_configurations(&self, opts: &ListConfigurationOptions) -> ClResult<u64> {
		self.enter().await?;
		Ok(self.records.lock().iter().filter(|r| opts.matches(r)).count() as u64)
	}

	async fn save_configuration(
		&self,
		record: &ConfigurationRecord,
	) -> ClResult<ConfigurationRecord> {
		self.saves.fetch_add(1, Ordering::SeqCst);
		let gate = self.save_gate.lock().take();
		if let Some(gate) = gate {
			gate.pass().await;
		}
		self.enter().await?;

		let key = record.natural_key();
		let mut records = self.records.lock();
		if let Some(existing) = records.iter_mut().find(|r| key.matches(r)) {
			existing.value = record.value.clone();
			existing.flags = record.flags.clone();
			existing.updated_at = record.updated_at;
			return Ok(existing.clone());
		}
		records.push(record.clone());
		Ok(record.clone())
	}

	async fn delete_configuration(&self, id: Uuid) -> ClResult<bool> {
		self.deletes.fetch_add(1, Ordering::SeqCst);
		self.enter().await?;

		let mut records = self.records.lock();
		let before = records.len();
		records.retain(|r| r.id != id);
		Ok(records.len() != before)
	}
}

// FlakyCache //
//************//
/// Memory cache backend with an availability switch
#[derive(Debug, Default)]
pub struct FlakyCache {
	inner: CacheAdapterMemory,
	unavailable: AtomicBool,
	delay: parking_lot::Mutex<Option<Duration>>,
	failing_deletes: AtomicU32,
	pub gets: AtomicUsize,
	pub sets: AtomicUsize,
	pub deletes: AtomicUsize,
}

impl FlakyCache {
	pub fn new() -> Arc<Self> {
		Arc::new(FlakyCache::default())
	}

	pub fn set_available(&self, available: bool) {
		self.unavailable.store(!available, Ordering::SeqCst);
	}

	/// Delay every call, to simulate a backend that hangs instead of failing
	pub fn set_delay(&self, delay: Option<Duration>) {
		*self.delay.lock() = delay;
	}

	/// Make the next `count` deletes fail while everything else keeps working
	pub fn fail_next_deletes(&self, count: u32) {
		self.failing_deletes.store(count, Ordering::SeqCst);
	}

	pub fn set_calls(&self) -> usize {
		self.sets.load(Ordering::SeqCst)
	}

	pub fn delete_calls(&self) -> usize {
		self.deletes.load(Ordering::SeqCst)
	}

	/// Raw entry, read without going through the availability switch
	pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
		self.inner.get(key).await.ok().flatten()
	}

	async fn check(&self) -> ClResult<()> {
		let delay = *self.delay.lock();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if self.unavailable.load(Ordering::SeqCst) {
			Err(Error::BackendUnavailable(Backend::Cache))
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl CacheAdapter for FlakyCache {
	async fn get(&self, key: &str) -> ClResult<Option<Vec<u8>>> {
		self.gets.fetch_add(1, Ordering::SeqCst);
		self.check().await?;
		self.inner.get(key).await
	}

	async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> ClResult<()> {
		self.sets.fetch_add(1, Ordering::SeqCst);
		self.check().await?;
		self.inner.set(key, value, ttl_secs).await
	}

	async fn delete(&self, key: &str) -> ClResult<()> {
		self.deletes.fetch_add(1, Ordering::SeqCst);
		self.check().await?;
		let failing = self
			.failing_deletes
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
			.is_ok();
		if failing {
			return Err(Error::BackendUnavailable(Backend::Cache));
		}
		self.inner.delete(key).await
	}
}

// vim: ts=4
