//! Session-level error types shared across the service, transport, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Auth service failure (rejection, malformed body, transport).
	#[error(transparent)]
	Api(#[from] AuthApiError),

	/// A newer login or registration attempt was issued before this one settled;
	/// the stale outcome was discarded without touching the session.
	#[error("Attempt {ticket} was superseded by a newer attempt.")]
	Superseded {
		/// Ticket issued to the discarded attempt.
		ticket: u64,
	},
}

/// Configuration and validation failures raised by the session core.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Auth API base URL could not be parsed.
	#[error("Auth API base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Auth API base URL uses a scheme other than HTTP(S).
	#[error("Auth API base URL must use HTTP or HTTPS: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Route path cannot be joined onto the API base URL.
	#[error("Route path `{path}` is invalid; paths must be absolute.")]
	InvalidRoutePath {
		/// The offending route path.
		path: String,
	},

	/// Wire response carried an invalid identifier.
	#[error("Auth response contains an invalid identifier.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Wire response carried a role outside the closed set.
	#[error("Auth response contains an unknown role.")]
	UnknownRole(#[from] crate::auth::RoleParseError),
	/// Principal builder validation failed.
	#[error("Unable to build principal.")]
	PrincipalBuild(#[from] crate::auth::PrincipalBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures surfaced while calling the external auth service.
#[derive(Debug, ThisError)]
pub enum AuthApiError {
	/// The auth service rejected the credentials or registration payload.
	///
	/// The message is the server-provided one when the error body parses, or the
	/// endpoint's fallback (`"Login failed"` / `"Registration failed"`) otherwise.
	#[error("{message}")]
	Rejected {
		/// Human-readable message for inline display.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The auth endpoint answered 2xx with a body that does not match the wire contract.
	#[error("Auth endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the auth endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the auth endpoint.")]
	Io(#[from] std::io::Error),
}
impl AuthApiError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for AuthApiError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
