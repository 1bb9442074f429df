//! Database schema initialization

use sqlx::SqlitePool;

/// Create tables and indexes if they do not exist yet
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Configurations
	//****************
	// owner_user_id is '' for system records: NULLs would never collide in the
	// natural key index.
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS configurations (
		id text NOT NULL,
		owner_user_id text NOT NULL DEFAULT '',
		cfg_key text NOT NULL,
		value text NOT NULL,
		context_key text NOT NULL,
		context_id text NOT NULL,
		workplace_id text NOT NULL,
		flags text NOT NULL DEFAULT '',
		created_at integer NOT NULL DEFAULT (unixepoch()),
		updated_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_configurations_natural_key
		ON configurations(owner_user_id, context_key, context_id, workplace_id, cfg_key)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_configurations_owner_key
		ON configurations(owner_user_id, cfg_key)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
