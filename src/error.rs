//! Broker-level error types shared across issuers, collaborators, and configuration.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical broker error exposed by issuance APIs.
///
/// Verification rejections are deliberately absent: they are expected outcomes and travel as
/// [`Verdict`](crate::verifier::Verdict) values instead.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller supplied a request the broker refuses to act on.
	#[error(transparent)]
	InvalidInput(#[from] InputError),
	/// Secret collaborator failed; issuance fails closed.
	#[error(transparent)]
	SecretUnavailable(#[from] crate::secret::SecretError),
	/// Cryptographic primitive or key material failure.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Classifies the error for the invocation boundary.
	pub fn class(&self) -> ErrorClass {
		match self {
			Self::InvalidInput(_) => ErrorClass::Client,
			Self::SecretUnavailable(_) | Self::Signing(_) | Self::Config(_) => ErrorClass::Server,
		}
	}

	/// Stable label used by spans and metrics.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::InvalidInput(_) => "invalid_input",
			Self::SecretUnavailable(_) => "secret_unavailable",
			Self::Signing(_) => "signing_error",
			Self::Config(_) => "config_error",
		}
	}
}

/// Request shape or value problems (caller errors).
#[derive(Debug, ThisError)]
pub enum InputError {
	/// The resource path was empty.
	#[error("Path cannot be empty.")]
	EmptyPath,
	/// The resource path did not start with `/`.
	#[error("Path must start with `/`.")]
	PathNotRooted,
	/// The resource path contained a character URL parsing would drop, escape, or rewrite
	/// (whitespace, controls, non-ASCII, `\`, `?`, `#`, and similar).
	#[error("Path contains a forbidden character: {character:?}.")]
	PathForbiddenCharacter {
		/// First offending character.
		character: char,
	},
	/// The resource path would be rewritten by URL normalization (e.g. `.` or `..` segments).
	#[error("Path must already be in normalized URL form.")]
	PathNotCanonical,
	/// Duration must be a positive number of hours.
	#[error("Duration must be at least one hour.")]
	ZeroDuration,
	/// Duration pushes the expiry outside the representable range.
	#[error("Duration of {hours} hours exceeds the supported range.")]
	DurationOutOfRange {
		/// Requested duration in hours.
		hours: u32,
	},
	/// Resource could not be parsed as an absolute URL.
	#[error("Resource is not an absolute URL.")]
	NotAbsoluteUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Resource URL carries a fragment, which is never sent to the edge.
	#[error("Resource URL must not carry a fragment.")]
	ResourceHasFragment,
	/// Resource URL has no host component.
	#[error("Resource URL must carry a host.")]
	MissingHost,
	/// Expiry must lie strictly after the issuance instant.
	#[error("Expiry must be strictly in the future.")]
	ExpiryNotInFuture,
	/// Request body could not be parsed.
	#[error("Request body is malformed at `{path}`.")]
	Body {
		/// JSON path of the offending field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for InputError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Body { path, source: e.into_inner() }
	}
}

/// Cryptographic failures. Messages never embed key material.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// No key material was supplied.
	#[error("Signing key is empty.")]
	EmptyKey,
	/// Key material is neither PKCS#1 nor PKCS#8 PEM.
	#[error("Signing key is malformed.")]
	MalformedKey,
	/// The RSA primitive rejected the operation.
	#[error("RSA signing failed.")]
	Rsa(#[source] rsa::Error),
	/// The canonical payload could not be produced.
	#[error("Payload could not be canonicalized.")]
	Canonicalize(#[source] serde_json::Error),
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A required identity string was empty.
	#[error("The {field} setting cannot be empty.")]
	Empty {
		/// Name of the offending setting.
		field: &'static str,
	},
	/// Origin must be an absolute https URL.
	#[error("Origin must be an absolute https URL: {url}.")]
	InsecureOrigin {
		/// Origin that failed validation.
		url: String,
	},
	/// Origin must not carry a query or fragment.
	#[error("Origin must not carry a query or fragment: {url}.")]
	OriginHasQuery {
		/// Origin that failed validation.
		url: String,
	},
	/// Default duration must be positive.
	#[error("The default duration must be at least one hour.")]
	ZeroDefaultDuration,
	/// Configuration document could not be parsed.
	#[error("Configuration is malformed at `{path}`: {message}.")]
	Parse {
		/// JSON path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
}

/// Coarse error classes the invocation boundary maps to status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
	/// Caller error (4xx).
	Client,
	/// Presented credential rejected (401).
	Unauthorized,
	/// Collaborator or cryptographic failure (5xx).
	Server,
}
impl ErrorClass {
	/// HTTP-equivalent status code.
	pub const fn status_code(self) -> u16 {
		match self {
			ErrorClass::Client => 400,
			ErrorClass::Unauthorized => 401,
			ErrorClass::Server => 500,
		}
	}
}

/// Failure body returned across the invocation boundary.
///
/// Only generic messages are exposed; internal detail stays in logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Caller-safe error summary.
	pub error: String,
}
impl ErrorResponse {
	/// Single body shared by every verification rejection.
	pub fn unauthorized() -> Self {
		Self { error: "Unauthorized.".into() }
	}

	/// Builds the caller-safe body for an issuance error.
	pub fn from_error(err: &Error) -> Self {
		let error = match err {
			// Input errors describe the caller's own request and never carry secrets.
			Error::InvalidInput(e) => e.to_string(),
			Error::SecretUnavailable(_) | Error::Signing(_) | Error::Config(_) =>
				"Credential could not be issued.".into(),
		};

		Self { error }
	}
}
