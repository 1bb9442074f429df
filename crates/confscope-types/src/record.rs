//! Configuration records, natural keys, scopes and store filters

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::flag::{Flag, FlagSet};
use crate::prelude::*;

/// Maximum length (in characters) of `key` and `context_key`
pub const MAX_KEY_LENGTH: usize = 255;

pub const SYSTEM_CACHE_KEY: &str = "system_configurations";
pub const USER_CACHE_KEY_PREFIX: &str = "configurations_";

/// A stored configuration value
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRecord {
	/// Generated identifier, immutable after creation
	pub id: Uuid,
	/// Owning user, absent for system-level records
	pub owner_user_id: Option<UserId>,
	pub key: Box<str>,
	/// Stored verbatim, never null
	pub value: serde_json::Value,
	pub context_key: Box<str>,
	pub context_id: Uuid,
	pub workplace_id: Uuid,
	pub flags: FlagSet,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

impl ConfigurationRecord {
	pub fn natural_key(&self) -> NaturalKey {
		NaturalKey {
			owner_user_id: self.owner_user_id,
			context_key: self.context_key.clone(),
			context_id: self.context_id,
			workplace_id: self.workplace_id,
			key: self.key.clone(),
		}
	}

	pub fn scope(&self) -> Scope {
		Scope::of_owner(self.owner_user_id)
	}
}

/// Identity of a record independent of its generated id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
	pub owner_user_id: Option<UserId>,
	pub context_key: Box<str>,
	pub context_id: Uuid,
	pub workplace_id: Uuid,
	pub key: Box<str>,
}

impl NaturalKey {
	pub fn matches(&self, record: &ConfigurationRecord) -> bool {
		self.owner_user_id == record.owner_user_id
			&& self.context_key == record.context_key
			&& self.context_id == record.context_id
			&& self.workplace_id == record.workplace_id
			&& self.key == record.key
	}
}

impl std::fmt::Display for NaturalKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.owner_user_id {
			Some(owner) => write!(f, "{}/", owner)?,
			None => write!(f, "-/")?,
		}
		write!(f, "{}/{}/{}/{}", self.context_key, self.context_id, self.workplace_id, self.key)
	}
}

/// Caller-supplied data for creating or updating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertConfiguration {
	pub owner_user_id: Option<UserId>,
	pub key: Box<str>,
	pub value: serde_json::Value,
	pub context_key: Box<str>,
	pub context_id: Uuid,
	pub workplace_id: Uuid,
	/// `None` keeps the flags of an existing record, or applies the defaults on create
	#[serde(default)]
	pub flags: Option<FlagSet>,
}

impl UpsertConfiguration {
	pub fn validate(&self) -> ClResult<()> {
		validate_key("key", &self.key)?;
		validate_key("contextKey", &self.context_key)?;
		if self.value.is_null() {
			return Err(Error::ValidationError(
				"Configuration value cannot be null, delete the record instead".into(),
			));
		}
		Ok(())
	}

	pub fn natural_key(&self) -> NaturalKey {
		NaturalKey {
			owner_user_id: self.owner_user_id,
			context_key: self.context_key.clone(),
			context_id: self.context_id,
			workplace_id: self.workplace_id,
			key: self.key.clone(),
		}
	}

	/// Flags a freshly created record gets when the caller sent none
	pub fn default_flags(&self) -> FlagSet {
		match self.owner_user_id {
			Some(_) => FlagSet::from([Flag::User]),
			None => FlagSet::new(),
		}
	}
}

/// Check a `key`-like field: non-empty and at most `MAX_KEY_LENGTH` characters
pub fn validate_key(field: &str, value: &str) -> ClResult<()> {
	if value.is_empty() {
		return Err(Error::ValidationError(format!("{} cannot be empty", field)));
	}
	if value.chars().count() > MAX_KEY_LENGTH {
		return Err(Error::ValidationError(format!(
			"{} exceeds {} characters",
			field, MAX_KEY_LENGTH
		)));
	}
	Ok(())
}

/// Caching and ownership boundary of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
	/// Records without an owner
	System,
	/// Records owned by one user
	User(UserId),
}

impl Scope {
	pub fn of_owner(owner_user_id: Option<UserId>) -> Self {
		match owner_user_id {
			Some(user_id) => Scope::User(user_id),
			None => Scope::System,
		}
	}

	pub fn cache_key(&self) -> String {
		match self {
			Scope::System => SYSTEM_CACHE_KEY.to_string(),
			Scope::User(user_id) => format!("{}{}", USER_CACHE_KEY_PREFIX, user_id),
		}
	}

	/// Store filter selecting exactly the records of this scope
	pub fn filter(&self) -> ListConfigurationOptions {
		ListConfigurationOptions { owner: OwnerFilter::from(*self), ..Default::default() }
	}

	pub fn contains(&self, record: &ConfigurationRecord) -> bool {
		record.scope() == *self
	}
}

impl std::fmt::Display for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Scope::System => write!(f, "system"),
			Scope::User(user_id) => write!(f, "user:{}", user_id),
		}
	}
}

/// Owner part of a store filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerFilter {
	#[default]
	Any,
	/// Only records without an owner
	System,
	User(UserId),
}

impl From<Scope> for OwnerFilter {
	fn from(scope: Scope) -> Self {
		match scope {
			Scope::System => OwnerFilter::System,
			Scope::User(user_id) => OwnerFilter::User(user_id),
		}
	}
}

/// Structured store filter; every `None` field matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListConfigurationOptions {
	pub owner: OwnerFilter,
	pub key: Option<Box<str>>,
	pub context_key: Option<Box<str>>,
	pub context_id: Option<Uuid>,
	pub workplace_id: Option<Uuid>,
	pub limit: Option<u32>,
}

impl ListConfigurationOptions {
	pub fn with_key(mut self, key: impl Into<Box<str>>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// In-memory evaluation of the filter (ignores `limit`)
	pub fn matches(&self, record: &ConfigurationRecord) -> bool {
		let owner_ok = match self.owner {
			OwnerFilter::Any => true,
			OwnerFilter::System => record.owner_user_id.is_none(),
			OwnerFilter::User(user_id) => record.owner_user_id == Some(user_id),
		};
		owner_ok
			&& self.key.as_ref().is_none_or(|key| *key == record.key)
			&& self.context_key.as_ref().is_none_or(|ck| *ck == record.context_key)
			&& self.context_id.is_none_or(|id| id == record.context_id)
			&& self.workplace_id.is_none_or(|id| id == record.workplace_id)
	}
}


// vim: ts=4
