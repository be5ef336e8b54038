//! Secret retrieval contracts and built-in providers.
//!
//! The broker asks its [`SecretProvider`] exactly once per operation and treats the answer as
//! immutable until the operation finishes. Providers never fall back to compiled-in defaults: a
//! missing secret is a [`SecretError`] and issuance fails closed.

pub mod env;
pub mod memory;

pub use env::EnvSecrets;
pub use memory::MemorySecrets;

// self
use crate::_prelude::*;

/// Future returned by [`SecretProvider::get_secret`].
pub type SecretFuture<'a> =
	Pin<Box<dyn Future<Output = Result<SecretBytes, SecretError>> + 'a + Send>>;

/// Resolves named secrets and key material.
pub trait SecretProvider
where
	Self: Send + Sync,
{
	/// Fetches the secret registered under `name`.
	fn get_secret<'a>(&'a self, name: &'a str) -> SecretFuture<'a>;
}

/// Error type produced by [`SecretProvider`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SecretError {
	/// No secret is registered under the requested name.
	#[error("Secret `{name}` is not available.")]
	NotFound {
		/// Requested secret name.
		name: String,
	},
	/// The secret exists but holds no bytes.
	#[error("Secret `{name}` is empty.")]
	Empty {
		/// Requested secret name.
		name: String,
	},
	/// Backend-level failure (network, permissions, throttling).
	#[error("Secret backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Redacted secret wrapper keeping key material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Vec<u8>);
impl SecretBytes {
	/// Wraps raw secret bytes.
	pub fn new(value: impl Into<Vec<u8>>) -> Self {
		Self(value.into())
	}

	/// Returns the inner bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Returns `true` when no bytes are held.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<&str> for SecretBytes {
	fn from(value: &str) -> Self {
		Self::new(value.as_bytes())
	}
}
impl From<String> for SecretBytes {
	fn from(value: String) -> Self {
		Self::new(value.into_bytes())
	}
}
impl Debug for SecretBytes {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretBytes").field(&"<redacted>").finish()
	}
}
impl Display for SecretBytes {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Rejects empty secrets so no provider can hand out a zero-length key.
pub(crate) fn ensure_present(name: &str, secret: SecretBytes) -> Result<SecretBytes, SecretError> {
	if secret.is_empty() {
		return Err(SecretError::Empty { name: name.to_owned() });
	}

	Ok(secret)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = SecretBytes::from("super-secret");

		assert_eq!(format!("{secret:?}"), "SecretBytes(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), b"super-secret");
	}

	#[test]
	fn empty_secrets_are_unavailable() {
		let err = ensure_present("jwt", SecretBytes::new(Vec::new()))
			.expect_err("Empty secret must be rejected.");

		assert_eq!(err, SecretError::Empty { name: "jwt".into() });
	}
}
