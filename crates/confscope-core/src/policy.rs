//! Mutation policy: which calling contexts may write which protection flags.
//!
//! Flags are privilege requirements layered on top of context trust:
//! `PROTECTED_SYSTEM` requires the `system` context, `PROTECTED_WORKPLACE`
//! requires `system` or `workplace`, everything else is writable from any
//! context.

use crate::prelude::*;

/// Decide whether a record carrying `flags` may be written from `context`
pub fn is_mutation_allowed(flags: &FlagSet, context: &Context) -> bool {
	if flags.contains(Flag::ProtectedSystem) && *context != Context::System {
		return false;
	}
	if flags.contains(Flag::ProtectedWorkplace)
		&& !matches!(context, Context::System | Context::Workplace)
	{
		return false;
	}
	true
}

/// Same decision as [`is_mutation_allowed`], as a `PolicyViolation` error
pub fn check_mutation(flags: &FlagSet, context: &Context, key: &NaturalKey) -> ClResult<()> {
	if is_mutation_allowed(flags, context) {
		return Ok(());
	}

	warn!("Denied write of {} with flags {} from context '{}'", key, flags, context);
	Err(Error::PolicyViolation(format!(
		"flags {} cannot be written from context '{}'",
		flags, context
	)))
}


// vim: ts=4
