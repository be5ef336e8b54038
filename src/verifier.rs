//! The trust boundary: classifies a presented credential and dispatches it to its scheme.
//!
//! Verification is terminal and single-shot. A presented credential ends in exactly one
//! [`Verdict`]; rejections are ordinary values rather than errors, and the invocation boundary
//! renders every rejection with the same [`ErrorResponse::unauthorized`] body so callers cannot
//! tell them apart.

// self
use crate::{
	_prelude::*,
	algorithm::{HmacSha256Key, RsaVerifyingKey},
	config::AuthorityConfig,
	error::{ErrorClass, ErrorResponse},
	grant::{AccessGrant, Scheme},
	scheme::{
		ClaimsToken, ClaimsTokenIssuer, PolicySigner, SealedToken, SealedTokenIssuer, SignedPolicy,
	},
};

/// Reasons a presented credential is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
	/// The credential could not be parsed or does not describe this authority.
	Malformed,
	/// The signature or seal does not match.
	SignatureMismatch,
	/// The credential is past its expiry.
	Expired,
}
impl Rejection {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Rejection::Malformed => "malformed",
			Rejection::SignatureMismatch => "signature_mismatch",
			Rejection::Expired => "expired",
		}
	}
}
impl Display for Rejection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal outcome of verifying a presented credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
	/// The credential is authentic and unexpired.
	Valid(AccessGrant),
	/// The credential is past its expiry.
	Expired,
	/// The signature or seal does not match.
	SignatureMismatch,
	/// The credential could not be parsed.
	Malformed,
}
impl Verdict {
	/// Returns `true` only for [`Verdict::Valid`].
	pub fn is_valid(&self) -> bool {
		matches!(self, Verdict::Valid(_))
	}

	/// Grant carried by a valid verdict.
	pub fn grant(&self) -> Option<&AccessGrant> {
		match self {
			Verdict::Valid(grant) => Some(grant),
			_ => None,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Verdict::Valid(_) => "valid",
			Verdict::Expired => Rejection::Expired.as_str(),
			Verdict::SignatureMismatch => Rejection::SignatureMismatch.as_str(),
			Verdict::Malformed => Rejection::Malformed.as_str(),
		}
	}

	/// Caller-facing rendering of a rejection; `None` for valid verdicts.
	pub fn rejection_response(&self) -> Option<(ErrorClass, ErrorResponse)> {
		(!self.is_valid()).then(|| (ErrorClass::Unauthorized, ErrorResponse::unauthorized()))
	}
}
impl From<Rejection> for Verdict {
	fn from(rejection: Rejection) -> Self {
		match rejection {
			Rejection::Malformed => Verdict::Malformed,
			Rejection::SignatureMismatch => Verdict::SignatureMismatch,
			Rejection::Expired => Verdict::Expired,
		}
	}
}
impl From<Result<AccessGrant, Rejection>> for Verdict {
	fn from(result: Result<AccessGrant, Rejection>) -> Self {
		match result {
			Ok(grant) => Verdict::Valid(grant),
			Err(rejection) => rejection.into(),
		}
	}
}

/// A presented credential, tagged by scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
	/// Signed claims token.
	Claims(ClaimsToken),
	/// Canned-policy signed URL.
	SignedPolicyUrl(SignedPolicy),
	/// HMAC-sealed token.
	Sealed(SealedToken),
}
impl Credential {
	/// Classifies a presented string by shape and parses it.
	///
	/// `http(s)://` strings are signed URLs, strings containing `.` are claims tokens (the sealed
	/// token alphabet has no `.`), and everything else is a sealed token. Surrounding whitespace
	/// or control characters make the credential malformed; it is never trimmed.
	pub fn parse(presented: &str) -> Result<Self, Rejection> {
		let padded = |c: char| c.is_whitespace() || c.is_control();

		if presented.starts_with(padded) || presented.ends_with(padded) {
			return Err(Rejection::Malformed);
		}
		if presented.starts_with("https://") || presented.starts_with("http://") {
			return SignedPolicy::from_url(presented).map(Credential::SignedPolicyUrl);
		}
		if presented.contains('.') {
			return ClaimsToken::parse(presented).map(Credential::Claims);
		}

		SealedToken::parse(presented).map(Credential::Sealed)
	}

	/// Scheme the credential belongs to.
	pub fn scheme(&self) -> Scheme {
		match self {
			Credential::Claims(_) => Scheme::Claims,
			Credential::SignedPolicyUrl(_) => Scheme::SignedUrl,
			Credential::Sealed(_) => Scheme::Sealed,
		}
	}
}

/// Key material a verification may need; only the presented scheme's key has to be loaded.
#[derive(Clone, Debug, Default)]
pub struct VerificationKeys {
	/// Shared secret for claims tokens.
	pub claims: Option<HmacSha256Key>,
	/// Shared secret for sealed tokens.
	pub sealed: Option<HmacSha256Key>,
	/// Public key for signed URLs.
	pub policy: Option<RsaVerifyingKey>,
}

/// Verifies presented credentials on behalf of one authority.
#[derive(Clone, Copy, Debug)]
pub struct CredentialVerifier<'a> {
	config: &'a AuthorityConfig,
}
impl<'a> CredentialVerifier<'a> {
	/// Binds the verifier to an authority.
	pub fn new(config: &'a AuthorityConfig) -> Self {
		Self { config }
	}

	/// Parses and verifies a presented credential string.
	pub fn verify(&self, presented: &str, keys: &VerificationKeys, now: OffsetDateTime) -> Verdict {
		match Credential::parse(presented) {
			Ok(credential) => self.verify_credential(&credential, keys, now),
			Err(rejection) => rejection.into(),
		}
	}

	/// Verifies a parsed credential.
	///
	/// A credential whose scheme key was not supplied cannot be authenticated and is reported as
	/// a signature mismatch.
	pub fn verify_credential(
		&self,
		credential: &Credential,
		keys: &VerificationKeys,
		now: OffsetDateTime,
	) -> Verdict {
		let result = match (credential, keys) {
			(Credential::Claims(token), VerificationKeys { claims: Some(key), .. }) =>
				ClaimsTokenIssuer::new(self.config).verify_token(token, key, now),
			(Credential::Sealed(token), VerificationKeys { sealed: Some(key), .. }) =>
				SealedTokenIssuer::new(self.config).verify_token(token, key, now),
			(Credential::SignedPolicyUrl(signed), VerificationKeys { policy: Some(key), .. }) =>
				PolicySigner::new(self.config).verify_signed(signed, key, now),
			_ => Err(Rejection::SignatureMismatch),
		};

		result.into()
	}
}
