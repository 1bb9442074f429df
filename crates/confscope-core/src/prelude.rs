pub use confscope_types::prelude::*;

pub use confscope_types::flag::{Flag, FlagSet};
pub use confscope_types::record::{
	ConfigurationRecord, ListConfigurationOptions, NaturalKey, OwnerFilter, Scope,
	UpsertConfiguration,
};
pub use confscope_types::types::Context;

// vim: ts=4
