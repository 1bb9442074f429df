//! Adapter that durably stores configuration records.

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use crate::prelude::*;
use crate::record::{ConfigurationRecord, ListConfigurationOptions, NaturalKey};

#[async_trait]
pub trait ConfigStoreAdapter: Debug + Send + Sync {
	/// Reads a record by its generated identifier
	async fn read_configuration(&self, id: Uuid) -> ClResult<Option<ConfigurationRecord>>;

	/// Point lookup by natural key
	async fn find_configuration(&self, key: &NaturalKey) -> ClResult<Option<ConfigurationRecord>>;

	/// Lists records matching a filter, ordered by `updated_at` (oldest first)
	async fn list_configurations(
		&self,
		opts: &ListConfigurationOptions,
	) -> ClResult<Vec<ConfigurationRecord>>;

	async fn count_configurations(&self, opts: &ListConfigurationOptions) -> ClResult<u64>;

	/// Inserts or updates a record, matching on the natural key.
	///
	/// When a record with the same natural key already exists its `value`,
	/// `flags` and `updated_at` are replaced while `id` and `created_at` are kept.
	/// Returns the stored record.
	async fn save_configuration(
		&self,
		record: &ConfigurationRecord,
	) -> ClResult<ConfigurationRecord>;

	/// Removes a record. Returns `false` if it did not exist.
	async fn delete_configuration(&self, id: Uuid) -> ClResult<bool>;
}

// vim: ts=4
