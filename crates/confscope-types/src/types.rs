//! Common types used throughout confscope.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::prelude::*;

pub const SYSTEM_CONTEXT: &str = "system";
pub const WORKPLACE_CONTEXT: &str = "workplace";

// UserId //
//********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
	pub fn new() -> Self {
		UserId(Uuid::new_v4())
	}
}

impl Default for UserId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::str::FromStr for UserId {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		Uuid::parse_str(s)
			.map(UserId)
			.map_err(|_| Error::ValidationError(format!("Invalid user id: {}", s)))
	}
}

// Timestamp //
//***********//
/// Seconds since the Unix epoch
#[derive(
	Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0.saturating_add(seconds))
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// Context //
//*********//
/// Named execution boundary a mutation is attempted under.
///
/// Resolved from the caller's session by the identity layer; `"system"` and
/// `"workplace"` are the two trusted contexts, anything else is a custom
/// (user-level) context such as `"user_3"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Context {
	System,
	Workplace,
	Custom(Box<str>),
}

impl Context {
	pub fn parse(s: &str) -> ClResult<Self> {
		match s {
			"" => Err(Error::ValidationError("Context cannot be empty".into())),
			SYSTEM_CONTEXT => Ok(Context::System),
			WORKPLACE_CONTEXT => Ok(Context::Workplace),
			other => Ok(Context::Custom(other.into())),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			Context::System => SYSTEM_CONTEXT,
			Context::Workplace => WORKPLACE_CONTEXT,
			Context::Custom(s) => s,
		}
	}
}

impl std::str::FromStr for Context {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		Context::parse(s)
	}
}

impl std::fmt::Display for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for Context {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Context {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Context::parse(&s).map_err(serde::de::Error::custom)
	}
}


// vim: ts=4
