//! Thread-safe in-memory [`SecretProvider`] for local development and tests.

// self
use crate::{
	_prelude::*,
	secret::{self, SecretBytes, SecretError, SecretFuture, SecretProvider},
};

type SecretMap = Arc<RwLock<HashMap<String, SecretBytes>>>;

/// Secret provider that keeps values in-process.
#[derive(Clone, Debug, Default)]
pub struct MemorySecrets(SecretMap);
impl MemorySecrets {
	/// Registers (or replaces) a secret, returning `self` for chaining.
	pub fn with_secret(self, name: impl Into<String>, value: impl Into<SecretBytes>) -> Self {
		self.insert(name, value);

		self
	}

	/// Registers (or replaces) a secret.
	pub fn insert(&self, name: impl Into<String>, value: impl Into<SecretBytes>) {
		self.0.write().insert(name.into(), value.into());
	}

	/// Removes a secret, returning whether it existed.
	pub fn remove(&self, name: &str) -> bool {
		self.0.write().remove(name).is_some()
	}

	fn get_now(map: &SecretMap, name: &str) -> Result<SecretBytes, SecretError> {
		let value = map
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| SecretError::NotFound { name: name.to_owned() })?;

		secret::ensure_present(name, value)
	}
}
impl SecretProvider for MemorySecrets {
	fn get_secret<'a>(&'a self, name: &'a str) -> SecretFuture<'a> {
		let result = Self::get_now(&self.0, name);

		Box::pin(async move { result })
	}
}
