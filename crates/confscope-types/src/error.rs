//! Error type shared by the services and every adapter.

pub type ClResult<T> = std::result::Result<T, Error>;

/// Backend a `BackendUnavailable` error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
	Store,
	Cache,
}

impl std::fmt::Display for Backend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Backend::Store => write!(f, "store"),
			Backend::Cache => write!(f, "cache"),
		}
	}
}

#[derive(Debug)]
pub enum Error {
	/// Read or delete target does not exist
	NotFound,
	/// Malformed input, rejected before touching store or cache
	ValidationError(String),
	/// Mutation denied by the flag policy
	PolicyViolation(String),
	/// Store or cache unreachable (or timed out)
	BackendUnavailable(Backend),
	/// Store query failed
	DbError,
	/// Stored or cached payload could not be decoded
	Parse,
	/// Invalid runtime options
	ConfigError(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Only backend outages are worth retrying; everything else fails the same way again.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Error::BackendUnavailable(_))
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::debug!("JSON: {}", err);
		Self::Parse
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::PolicyViolation(msg) => write!(f, "policy violation: {}", msg),
			Error::BackendUnavailable(backend) => write!(f, "{} backend unavailable", backend),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}


// vim: ts=4
