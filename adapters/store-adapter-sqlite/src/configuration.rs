//! Configuration record queries

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use confscope_types::flag::FlagSet;
use confscope_types::prelude::*;
use confscope_types::record::{
	ConfigurationRecord, ListConfigurationOptions, NaturalKey, OwnerFilter,
};

use crate::{inspect, map_sqlx_err};

const COLUMNS: &str = "id, owner_user_id, cfg_key, value, context_key, context_id, workplace_id, \
	flags, created_at, updated_at";

fn owner_column(owner_user_id: Option<UserId>) -> String {
	owner_user_id.map(|id| id.to_string()).unwrap_or_default()
}

fn parse_uuid(row: &SqliteRow, column: &str) -> ClResult<Uuid> {
	let s: String = row.try_get(column).inspect_err(inspect).or(Err(Error::DbError))?;
	Uuid::parse_str(&s).inspect_err(|err| warn!("DB: bad uuid in {}: {}", column, err)).or(Err(Error::Parse))
}

fn map_record(row: &SqliteRow) -> ClResult<ConfigurationRecord> {
	let owner: String = row.try_get("owner_user_id").inspect_err(inspect).or(Err(Error::DbError))?;
	let owner_user_id = if owner.is_empty() { None } else { Some(owner.parse::<UserId>()?) };

	let value: String = row.try_get("value").inspect_err(inspect).or(Err(Error::DbError))?;
	let flags: String = row.try_get("flags").inspect_err(inspect).or(Err(Error::DbError))?;
	let key: String = row.try_get("cfg_key").inspect_err(inspect).or(Err(Error::DbError))?;
	let context_key: String =
		row.try_get("context_key").inspect_err(inspect).or(Err(Error::DbError))?;

	Ok(ConfigurationRecord {
		id: parse_uuid(row, "id")?,
		owner_user_id,
		key: key.into(),
		value: serde_json::from_str(&value)?,
		context_key: context_key.into(),
		context_id: parse_uuid(row, "context_id")?,
		workplace_id: parse_uuid(row, "workplace_id")?,
		flags: FlagSet::from_tags(&flags)?,
		created_at: Timestamp(row.try_get("created_at").inspect_err(inspect).or(Err(Error::DbError))?),
		updated_at: Timestamp(row.try_get("updated_at").inspect_err(inspect).or(Err(Error::DbError))?),
	})
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, opts: &ListConfigurationOptions) {
	match opts.owner {
		OwnerFilter::Any => {}
		OwnerFilter::System => {
			query.push(" AND owner_user_id = ''");
		}
		OwnerFilter::User(user_id) => {
			query.push(" AND owner_user_id = ").push_bind(user_id.to_string());
		}
	}
	if let Some(key) = &opts.key {
		query.push(" AND cfg_key = ").push_bind(key.to_string());
	}
	if let Some(context_key) = &opts.context_key {
		query.push(" AND context_key = ").push_bind(context_key.to_string());
	}
	if let Some(context_id) = opts.context_id {
		query.push(" AND context_id = ").push_bind(context_id.to_string());
	}
	if let Some(workplace_id) = opts.workplace_id {
		query.push(" AND workplace_id = ").push_bind(workplace_id.to_string());
	}
}

/// Read a single record by id
pub(crate) async fn read(db: &SqlitePool, id: Uuid) -> ClResult<Option<ConfigurationRecord>> {
	let sql = format!("SELECT {} FROM configurations WHERE id = ?", COLUMNS);
	let row = sqlx::query(&sql)
		.bind(id.to_string())
		.fetch_optional(db)
		.await
		.map_err(map_sqlx_err)?;

	row.as_ref().map(map_record).transpose()
}

/// Point lookup by natural key
pub(crate) async fn find(db: &SqlitePool, key: &NaturalKey) -> ClResult<Option<ConfigurationRecord>> {
	let sql = format!(
		"SELECT {} FROM configurations
		WHERE owner_user_id = ? AND context_key = ? AND context_id = ? AND workplace_id = ?
		AND cfg_key = ?",
		COLUMNS
	);
	let row = sqlx::query(&sql)
		.bind(owner_column(key.owner_user_id))
		.bind(&*key.context_key)
		.bind(key.context_id.to_string())
		.bind(key.workplace_id.to_string())
		.bind(&*key.key)
		.fetch_optional(db)
		.await
		.map_err(map_sqlx_err)?;

	row.as_ref().map(map_record).transpose()
}

/// List records matching a filter, oldest update first
pub(crate) async fn list(
	db: &SqlitePool,
	opts: &ListConfigurationOptions,
) -> ClResult<Vec<ConfigurationRecord>> {
	let mut query: QueryBuilder<Sqlite> =
		QueryBuilder::new(format!("SELECT {} FROM configurations WHERE 1 = 1", COLUMNS));
	push_filters(&mut query, opts);
	query.push(" ORDER BY updated_at, id");
	if let Some(limit) = opts.limit {
		query.push(" LIMIT ").push_bind(i64::from(limit));
	}

	let rows = query
		.build()
		.fetch_all(db)
		.await
		.map_err(map_sqlx_err)?;

	rows.iter().map(map_record).collect()
}

pub(crate) async fn count(db: &SqlitePool, opts: &ListConfigurationOptions) -> ClResult<u64> {
	let mut query: QueryBuilder<Sqlite> =
		QueryBuilder::new("SELECT COUNT(*) AS cnt FROM configurations WHERE 1 = 1");
	push_filters(&mut query, opts);

	let row = query
		.build()
		.fetch_one(db)
		.await
		.map_err(map_sqlx_err)?;
	let cnt: i64 = row.try_get("cnt").inspect_err(inspect).or(Err(Error::DbError))?;

	Ok(u64::try_from(cnt).unwrap_or_default())
}

/// Insert or update on the natural key; the first writer's id and created_at are kept
pub(crate) async fn save(
	db: &SqlitePool,
	record: &ConfigurationRecord,
) -> ClResult<ConfigurationRecord> {
	let sql = format!(
		"INSERT INTO configurations ({})
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		ON CONFLICT(owner_user_id, context_key, context_id, workplace_id, cfg_key) DO UPDATE SET
			value = excluded.value,
			flags = excluded.flags,
			updated_at = excluded.updated_at
		RETURNING {}",
		COLUMNS, COLUMNS
	);
	let row = sqlx::query(&sql)
		.bind(record.id.to_string())
		.bind(owner_column(record.owner_user_id))
		.bind(&*record.key)
		.bind(record.value.to_string())
		.bind(&*record.context_key)
		.bind(record.context_id.to_string())
		.bind(record.workplace_id.to_string())
		.bind(record.flags.to_tags())
		.bind(record.created_at.0)
		.bind(record.updated_at.0)
		.fetch_one(db)
		.await
		.map_err(map_sqlx_err)?;

	map_record(&row)
}

/// Delete a record, returning whether it existed
pub(crate) async fn delete(db: &SqlitePool, id: Uuid) -> ClResult<bool> {
	let res = sqlx::query("DELETE FROM configurations WHERE id = ?")
		.bind(id.to_string())
		.execute(db)
		.await
		.map_err(map_sqlx_err)?;

	Ok(res.rows_affected() > 0)
}

// vim: ts=4
