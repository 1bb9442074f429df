//! SQLite-backed configuration store.
//!
//! Records live in a single `configurations` table with a unique index on the
//! natural key, so concurrent saves of the same key collapse into one row.

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use confscope_types::prelude::*;
use confscope_types::record::{ConfigurationRecord, ListConfigurationOptions, NaturalKey};
use confscope_types::store_adapter::ConfigStoreAdapter;

mod configuration;
mod schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Connection level failures mean the store is unreachable, anything else is a query error
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> Error {
	inspect(&err);
	match err {
		sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
			Error::BackendUnavailable(Backend::Store)
		}
		_ => Error::DbError,
	}
}

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	/// Opens (or creates) the database file at `path`
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		let path = path.as_ref();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await?;
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal)
			.busy_timeout(BUSY_TIMEOUT);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.map_err(map_sqlx_err)?;

		schema::init_db(&db).await.map_err(map_sqlx_err)?;
		debug!("Configuration store opened at {}", path.display());

		Ok(Self { db })
	}

	/// Close the pool; later calls fail with `BackendUnavailable(Store)`
	pub async fn close(&self) {
		self.db.close().await;
	}
}

#[async_trait]
impl ConfigStoreAdapter for StoreAdapterSqlite {
	async fn read_configuration(&self, id: Uuid) -> ClResult<Option<ConfigurationRecord>> {
		configuration::read(&self.db, id).await
	}

	async fn find_configuration(&self, key: &NaturalKey) -> ClResult<Option<ConfigurationRecord>> {
		configuration::find(&self.db, key).await
	}

	async fn list_configurations(
		&self,
		opts: &ListConfigurationOptions,
	) -> ClResult<Vec<ConfigurationRecord>> {
		configuration::list(&self.db, opts).await
	}

	async fn count_configurations(&self, opts: &ListConfigurationOptions) -> ClResult<u64> {
		configuration::count(&self.db, opts).await
	}

	async fn save_configuration(
		&self,
		record: &ConfigurationRecord,
	) -> ClResult<ConfigurationRecord> {
		configuration::save(&self.db, record).await
	}

	async fn delete_configuration(&self, id: Uuid) -> ClResult<bool> {
		configuration::delete(&self.db, id).await
	}
}


// vim: ts=4
