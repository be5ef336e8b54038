//! [`SecretProvider`] backed by process environment variables.

// std
use std::env::{self, VarError};
// self
use crate::{
	_prelude::*,
	secret::{self, SecretBytes, SecretError, SecretFuture, SecretProvider},
};

/// Resolves secrets from environment variables.
///
/// A secret name maps to `<PREFIX><NAME>` with the name upper-cased and every non-alphanumeric
/// character replaced by `_`, so `staging-jwt-secret` reads `ACCESS_BROKER_STAGING_JWT_SECRET`
/// under the default prefix. Explicit overrides take precedence over the derived name.
#[derive(Clone, Debug)]
pub struct EnvSecrets {
	prefix: String,
	overrides: BTreeMap<String, String>,
}
impl EnvSecrets {
	const DEFAULT_PREFIX: &'static str = "ACCESS_BROKER_";

	/// Creates a provider using the given variable prefix.
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into(), overrides: BTreeMap::new() }
	}

	/// Reads the secret `name` from the exact variable `var` instead of the derived one.
	pub fn with_variable(mut self, name: impl Into<String>, var: impl Into<String>) -> Self {
		self.overrides.insert(name.into(), var.into());

		self
	}

	/// Environment variable consulted for `name`.
	pub fn variable_for(&self, name: &str) -> String {
		if let Some(var) = self.overrides.get(name) {
			return var.clone();
		}

		let mut var = self.prefix.clone();

		var.extend(name.chars().map(|c| match c.is_ascii_alphanumeric() {
			true => c.to_ascii_uppercase(),
			false => '_',
		}));

		var
	}

	fn get_now(&self, name: &str) -> Result<SecretBytes, SecretError> {
		let var = self.variable_for(name);
		let value = match env::var(&var) {
			Ok(value) => value,
			Err(VarError::NotPresent) => return Err(SecretError::NotFound { name: name.to_owned() }),
			Err(VarError::NotUnicode(_)) =>
				return Err(SecretError::Backend {
					message: format!("variable `{var}` is not valid unicode"),
				}),
		};

		secret::ensure_present(name, SecretBytes::from(value))
	}
}
impl Default for EnvSecrets {
	fn default() -> Self {
		Self::with_prefix(Self::DEFAULT_PREFIX)
	}
}
impl SecretProvider for EnvSecrets {
	fn get_secret<'a>(&'a self, name: &'a str) -> SecretFuture<'a> {
		let result = self.get_now(name);

		Box::pin(async move { result })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn derived_variable_names() {
		let secrets = EnvSecrets::default();

		assert_eq!(secrets.variable_for("staging-jwt-secret"), "ACCESS_BROKER_STAGING_JWT_SECRET");
		assert_eq!(EnvSecrets::with_prefix("").variable_for("a.b"), "A_B");
	}

	#[tokio::test]
	async fn missing_variables_fail_closed() {
		let secrets = EnvSecrets::with_prefix("ACCESS_BROKER_TEST_UNSET_");
		let err = secrets
			.get_secret("never-defined")
			.await
			.expect_err("Unset variable must not resolve to a default.");

		assert_eq!(err, SecretError::NotFound { name: "never-defined".into() });
	}

	#[tokio::test]
	async fn overrides_read_the_named_variable() {
		let secrets = EnvSecrets::default().with_variable("search-path", "PATH");

		assert_eq!(secrets.variable_for("search-path"), "PATH");

		if env::var("PATH").is_ok_and(|v| !v.is_empty()) {
			secrets
				.get_secret("search-path")
				.await
				.expect("PATH should resolve through the override.");
		}
	}
}
