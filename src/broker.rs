//! Broker facade that wires collaborators into the credential schemes.
//!
//! Each call reads the clock once and asks the [`SecretProvider`] for exactly one secret, then
//! runs the scheme synchronously. Nothing is cached between calls, so concurrent operations
//! share no mutable state and a rotated secret takes effect on the next call.

// self
use crate::{
	_prelude::*,
	algorithm::{HmacSha256Key, RsaSigningKey, RsaVerifyingKey},
	clock::{ClockSource, SystemClock},
	config::AuthorityConfig,
	grant::{AccessRequest, IssuedCredential, Scheme},
	obs::{self, OpSpan, Operation, Outcome},
	scheme::{ClaimsTokenIssuer, PolicySigner, SealedTokenIssuer},
	secret::{SecretBytes, SecretProvider},
	verifier::{Credential, CredentialVerifier, VerificationKeys, Verdict},
};

/// Issues and verifies access credentials for one authority.
#[derive(Clone)]
pub struct AccessBroker {
	/// Authority identity, origin, and secret names.
	pub config: Arc<AuthorityConfig>,
	/// Secret collaborator consulted once per operation.
	pub secrets: Arc<dyn SecretProvider>,
	/// Time source consulted once per operation.
	pub clock: Arc<dyn ClockSource>,
}
impl AccessBroker {
	/// Creates a broker that reads the system clock.
	pub fn new(config: impl Into<Arc<AuthorityConfig>>, secrets: Arc<dyn SecretProvider>) -> Self {
		Self::with_clock(config, secrets, Arc::new(SystemClock))
	}

	/// Creates a broker with an explicit clock.
	pub fn with_clock(
		config: impl Into<Arc<AuthorityConfig>>,
		secrets: Arc<dyn SecretProvider>,
		clock: Arc<dyn ClockSource>,
	) -> Self {
		Self { config: config.into(), secrets, clock }
	}

	/// Issues a credential of the requested scheme.
	///
	/// Fails closed: if the secret cannot be fetched or parsed, no credential is produced.
	pub async fn issue(&self, scheme: Scheme, request: &AccessRequest) -> Result<IssuedCredential> {
		const OP: Operation = Operation::Issue;

		let span = OpSpan::new(OP, scheme.as_str());

		obs::record_outcome(OP, scheme.as_str(), Outcome::Attempt);

		let result = span
			.instrument(async move {
				let issued_at = self.clock.now();
				let config = self.config.as_ref();

				match scheme {
					Scheme::Claims => {
						let key = self.hmac_key(&config.secrets.claims_secret).await?;

						ClaimsTokenIssuer::new(config).issue(request, &key, issued_at)
					},
					Scheme::Sealed => {
						let key = self.hmac_key(&config.secrets.sealed_secret).await?;

						SealedTokenIssuer::new(config).issue(request, &key, issued_at)
					},
					Scheme::SignedUrl => {
						let pem = self.fetch(&config.secrets.policy_private_key).await?;
						let key = RsaSigningKey::from_pem(&pem)?;

						PolicySigner::new(config).issue(request, &key, issued_at)
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OP, scheme.as_str(), Outcome::Success),
			Err(e) => {
				obs::log_failure(OP, e);
				obs::record_outcome(OP, scheme.as_str(), Outcome::Failure);
			},
		}

		result
	}

	/// Parses an inbound JSON body and issues a credential for it.
	pub async fn issue_from_json(&self, scheme: Scheme, body: &[u8]) -> Result<IssuedCredential> {
		let request = AccessRequest::from_json(body, self.config.default_duration_hours)?;

		self.issue(scheme, &request).await
	}

	/// Verifies a presented credential.
	///
	/// Rejections come back as `Ok` verdicts. `Err` means the broker itself could not decide
	/// (the scheme's secret was unavailable or unusable), which the caller must treat as a
	/// server failure and never as authorization.
	pub async fn verify(&self, presented: &str) -> Result<Verdict> {
		const OP: Operation = Operation::Verify;

		let credential = match Credential::parse(presented) {
			Ok(credential) => credential,
			Err(rejection) => {
				obs::log_rejection(rejection.as_str());
				obs::record_outcome(OP, "unknown", Outcome::Verdict(rejection.as_str()));

				return Ok(rejection.into());
			},
		};
		let scheme = credential.scheme();
		let span = OpSpan::new(OP, scheme.as_str());

		obs::record_outcome(OP, scheme.as_str(), Outcome::Attempt);

		let result = span
			.instrument(async move {
				let now = self.clock.now();
				let keys = self.verification_keys(scheme).await?;

				Ok::<_, Error>(
					CredentialVerifier::new(&self.config).verify_credential(&credential, &keys, now),
				)
			})
			.await;

		match &result {
			Ok(verdict) => {
				if !verdict.is_valid() {
					obs::log_rejection(verdict.as_str());
				}

				obs::record_outcome(OP, scheme.as_str(), Outcome::Verdict(verdict.as_str()));
			},
			Err(e) => {
				obs::log_failure(OP, e);
				obs::record_outcome(OP, scheme.as_str(), Outcome::Failure);
			},
		}

		result
	}

	async fn verification_keys(&self, scheme: Scheme) -> Result<VerificationKeys> {
		let names = &self.config.secrets;
		let mut keys = VerificationKeys::default();

		match scheme {
			Scheme::Claims => keys.claims = Some(self.hmac_key(&names.claims_secret).await?),
			Scheme::Sealed => keys.sealed = Some(self.hmac_key(&names.sealed_secret).await?),
			Scheme::SignedUrl => {
				let pem = self.fetch(&names.policy_public_key).await?;

				keys.policy = Some(RsaVerifyingKey::from_pem(&pem)?);
			},
		}

		Ok(keys)
	}

	async fn hmac_key(&self, name: &str) -> Result<HmacSha256Key> {
		Ok(HmacSha256Key::new(self.fetch(name).await?)?)
	}

	async fn fetch(&self, name: &str) -> Result<SecretBytes> {
		Ok(self.secrets.get_secret(name).await?)
	}
}
impl Debug for AccessBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessBroker").field("config", &self.config).finish()
	}
}
