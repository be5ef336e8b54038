//! Issuing-authority configuration passed into the broker at construction time.

// self
use crate::{_prelude::*, error::ConfigError};

/// Names under which the [`SecretProvider`](crate::secret::SecretProvider) stores each key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretNames {
	/// Shared secret keying signed claims tokens.
	pub claims_secret: String,
	/// Shared secret keying sealed tokens.
	pub sealed_secret: String,
	/// PEM-encoded RSA private key for canned-policy signing.
	pub policy_private_key: String,
	/// PEM-encoded RSA public key for canned-policy verification.
	pub policy_public_key: String,
}
impl Default for SecretNames {
	fn default() -> Self {
		Self {
			claims_secret: "staging-jwt-secret".into(),
			sealed_secret: "staging-seal-secret".into(),
			policy_private_key: "staging-cloudfront-private-key".into(),
			policy_public_key: "staging-cloudfront-public-key".into(),
		}
	}
}

/// Immutable description of the issuing authority and the protected resource domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
	/// Value stamped into (and required of) the `iss` claim.
	pub issuer: String,
	/// Value stamped into (and required of) the `aud` claim.
	pub audience: String,
	/// Absolute https origin that resource paths are resolved against.
	pub origin: Url,
	/// Key pair identifier published alongside signed URLs.
	pub key_pair_id: String,
	/// Duration applied when a request omits one.
	pub default_duration_hours: u32,
	/// Secret lookup names.
	#[serde(default)]
	pub secrets: SecretNames,
}
impl AuthorityConfig {
	/// Default duration for requests that do not specify one.
	pub const DEFAULT_DURATION_HOURS: u32 = 24;

	/// Creates a new builder for the provided issuer and audience.
	pub fn builder(issuer: impl Into<String>, audience: impl Into<String>) -> AuthorityConfigBuilder {
		AuthorityConfigBuilder::new(issuer, audience)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(raw: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de).map_err(|e| {
			ConfigError::Parse { path: e.path().to_string(), message: e.inner().to_string() }
		})?;

		config.validate()?;

		Ok(config)
	}

	/// Resolves a slash-rooted path against the configured origin.
	///
	/// The path is appended verbatim so the result matches what clients request.
	pub fn resource_url(&self, path: &str) -> Result<Url, url::ParseError> {
		let origin = self.origin.as_str().trim_end_matches('/');

		Url::parse(&format!("{origin}{path}"))
	}

	fn validate(&self) -> Result<(), ConfigError> {
		for (field, value) in
			[("issuer", &self.issuer), ("audience", &self.audience), ("key_pair_id", &self.key_pair_id)]
		{
			if value.trim().is_empty() {
				return Err(ConfigError::Empty { field });
			}
		}

		if self.origin.scheme() != "https" || self.origin.host_str().is_none() {
			return Err(ConfigError::InsecureOrigin { url: self.origin.to_string() });
		}
		if self.origin.query().is_some() || self.origin.fragment().is_some() {
			return Err(ConfigError::OriginHasQuery { url: self.origin.to_string() });
		}
		if self.default_duration_hours == 0 {
			return Err(ConfigError::ZeroDefaultDuration);
		}

		Ok(())
	}
}

/// Builder for [`AuthorityConfig`] values.
#[derive(Debug)]
pub struct AuthorityConfigBuilder {
	issuer: String,
	audience: String,
	origin: Option<Url>,
	key_pair_id: String,
	default_duration_hours: u32,
	secrets: SecretNames,
}
impl AuthorityConfigBuilder {
	fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
		Self {
			issuer: issuer.into(),
			audience: audience.into(),
			origin: None,
			key_pair_id: String::new(),
			default_duration_hours: AuthorityConfig::DEFAULT_DURATION_HOURS,
			secrets: SecretNames::default(),
		}
	}

	/// Sets the origin resource paths resolve against.
	pub fn origin(mut self, url: Url) -> Self {
		self.origin = Some(url);

		self
	}

	/// Sets the key pair identifier published with signed URLs.
	pub fn key_pair_id(mut self, id: impl Into<String>) -> Self {
		self.key_pair_id = id.into();

		self
	}

	/// Overrides the default request duration (hours).
	pub fn default_duration_hours(mut self, hours: u32) -> Self {
		self.default_duration_hours = hours;

		self
	}

	/// Overrides the secret lookup names.
	pub fn secrets(mut self, secrets: SecretNames) -> Self {
		self.secrets = secrets;

		self
	}

	/// Validates the collected values and produces an [`AuthorityConfig`].
	pub fn build(self) -> Result<AuthorityConfig, ConfigError> {
		let origin = self.origin.ok_or(ConfigError::Empty { field: "origin" })?;
		let config = AuthorityConfig {
			issuer: self.issuer,
			audience: self.audience,
			origin,
			key_pair_id: self.key_pair_id,
			default_duration_hours: self.default_duration_hours,
			secrets: self.secrets,
		};

		config.validate()?;

		Ok(config)
	}
}
