//! Protection flags carried by configuration records

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::prelude::*;

/// Protection tag restricting which contexts may mutate a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Flag {
	/// Only the `system` context may create or update the record
	#[serde(rename = "PROTECTED_SYSTEM")]
	ProtectedSystem,
	/// Only the `system` or `workplace` contexts may create or update the record
	#[serde(rename = "PROTECTED_WORKPLACE")]
	ProtectedWorkplace,
	/// User-level record, no extra restriction
	#[serde(rename = "USER")]
	User,
}

impl Flag {
	pub const ALL: [Flag; 3] = [Flag::ProtectedSystem, Flag::ProtectedWorkplace, Flag::User];

	pub fn as_str(self) -> &'static str {
		match self {
			Flag::ProtectedSystem => "PROTECTED_SYSTEM",
			Flag::ProtectedWorkplace => "PROTECTED_WORKPLACE",
			Flag::User => "USER",
		}
	}

	/// Parse a wire tag. Unknown tags are rejected, never ignored.
	pub fn parse(tag: &str) -> ClResult<Flag> {
		Flag::ALL
			.into_iter()
			.find(|flag| flag.as_str() == tag)
			.ok_or_else(|| Error::ValidationError(format!("Unknown flag: {}", tag)))
	}
}

impl std::fmt::Display for Flag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Flag {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		Flag::parse(s)
	}
}

/// Set of protection flags, serialized as a sorted array of tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<Flag>);

impl FlagSet {
	pub fn new() -> Self {
		Self(BTreeSet::new())
	}

	/// Ingest flags from their wire tags
	pub fn parse<I, S>(tags: I) -> ClResult<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		tags.into_iter().map(|tag| Flag::parse(tag.as_ref())).collect::<ClResult<_>>().map(Self)
	}

	pub fn contains(&self, flag: Flag) -> bool {
		self.0.contains(&flag)
	}

	pub fn insert(&mut self, flag: Flag) -> bool {
		self.0.insert(flag)
	}

	pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
		self.0.iter().copied()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Comma separated tags, used by the storage adapters
	pub fn to_tags(&self) -> String {
		self.iter().map(Flag::as_str).collect::<Vec<_>>().join(",")
	}

	pub fn from_tags(tags: &str) -> ClResult<Self> {
		Self::parse(tags.split(',').map(str::trim).filter(|tag| !tag.is_empty()))
	}
}

impl FromIterator<Flag> for FlagSet {
	fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<const N: usize> From<[Flag; N]> for FlagSet {
	fn from(flags: [Flag; N]) -> Self {
		flags.into_iter().collect()
	}
}

impl std::fmt::Display for FlagSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}]", self.to_tags())
	}
}


// vim: ts=4
