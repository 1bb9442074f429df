//! In-process cache backend
//!
//! Keeps entries in an LRU bounded by entry count. Each entry carries its own
//! expiry; expired entries are dropped when read.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;

use confscope_types::cache_adapter::CacheAdapter;
use confscope_types::prelude::*;

/// Default number of entries kept before the least recently used one is evicted
pub const DEFAULT_CAPACITY: usize = 1000;

struct Entry {
	value: Box<[u8]>,
	expires_at: Timestamp,
}

pub struct CacheAdapterMemory {
	entries: parking_lot::Mutex<LruCache<Box<str>, Entry>>,
}

impl CacheAdapterMemory {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		Self { entries: parking_lot::Mutex::new(LruCache::new(capacity)) }
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}
}

impl Default for CacheAdapterMemory {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

impl std::fmt::Debug for CacheAdapterMemory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let entries = self.entries.lock();
		f.debug_struct("CacheAdapterMemory")
			.field("len", &entries.len())
			.field("capacity", &entries.cap())
			.finish()
	}
}

#[async_trait]
impl CacheAdapter for CacheAdapterMemory {
	async fn get(&self, key: &str) -> ClResult<Option<Vec<u8>>> {
		let mut entries = self.entries.lock();
		match entries.get(key) {
			None => return Ok(None),
			Some(entry) if Timestamp::now() < entry.expires_at => {
				return Ok(Some(entry.value.to_vec()));
			}
			Some(_) => {}
		}
		debug!("Cache entry {} expired", key);
		entries.pop(key);
		Ok(None)
	}

	async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> ClResult<()> {
		let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
		let entry = Entry { value: value.into(), expires_at: Timestamp::now().add_seconds(ttl) };
		self.entries.lock().put(key.into(), entry);
		Ok(())
	}

	async fn delete(&self, key: &str) -> ClResult<()> {
		self.entries.lock().pop(key);
		Ok(())
	}
}


// vim: ts=4
