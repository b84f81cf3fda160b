//! Sidecar-level error types shared across startup, token acquisition, and serving.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical sidecar error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Startup configuration problem; fatal before the server binds.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token acquisition failure; surfaced to a single check request.
	#[error(transparent)]
	Acquire(#[from] AcquireError),
	/// Listener could not be bound or the accept loop failed.
	#[error("Failed to bind or serve the listen socket.")]
	Listen(
		#[from]
		#[source]
		std::io::Error,
	),
}

/// Configuration failures raised while resolving the startup snapshot.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// One or more required environment variables are unset or empty.
	#[error("Missing required environment variables: {}.", names.join(", "))]
	MissingEnv {
		/// Every missing variable name, reported in a single message.
		names: Vec<String>,
	},
	/// A present variable holds a value that cannot be parsed.
	#[error("Environment variable `{name}` holds an invalid value.")]
	Invalid {
		/// Offending variable name.
		name: &'static str,
		/// Underlying parse failure.
		#[source]
		source: BoxError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: ReqwestError,
	},
}
impl ConfigError {
	/// Wraps a parse failure for the named environment variable.
	pub fn invalid(name: &'static str, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Invalid { name, source: Box::new(src) }
	}
}

/// Token acquisition failures; returned to the caller, never cached.
#[derive(Debug, ThisError)]
pub enum AcquireError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: ReqwestError,
	},
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned status {status}.")]
	Endpoint {
		/// HTTP status code received from the endpoint.
		status: u16,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// Token endpoint returned an empty token value.
	#[error("Token endpoint returned an empty token value.")]
	EmptyToken,
}
impl From<ReqwestError> for AcquireError {
	fn from(e: ReqwestError) -> Self {
		Self::Transport { source: e }
	}
}
