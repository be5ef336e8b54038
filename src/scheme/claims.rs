//! Signed claims tokens: `base64url(header).base64url(claims).base64url(signature)`.
//!
//! Tokens are sealed with HMAC-SHA256 under the shared claims secret. The header is fixed to
//! `{"alg":"HS256","typ":"JWT"}`; any other header is rejected as malformed so a token can never
//! pick its own verification algorithm.

// self
use crate::{
	_prelude::*,
	algorithm::{HmacSha256Key, Signer, SigningAlgorithm, Verifier},
	config::AuthorityConfig,
	encoding,
	grant::{AccessGrant, AccessRequest, IssuedCredential, Scheme},
	scheme,
	verifier::Rejection,
};

const TOKEN_TYPE: &str = "JWT";

/// Token header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsHeader {
	/// Signature algorithm.
	pub alg: SigningAlgorithm,
	/// Token type.
	pub typ: String,
}
impl Default for ClaimsHeader {
	fn default() -> Self {
		Self { alg: SigningAlgorithm::HmacSha256, typ: TOKEN_TYPE.into() }
	}
}

/// Claim set bound by the token signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Resource path the token authorizes.
	pub path: String,
	/// Expiry (epoch seconds).
	pub exp: i64,
	/// Issued-at (epoch seconds).
	pub iat: i64,
	/// Issuing authority.
	pub iss: String,
	/// Protected resource domain.
	pub aud: String,
}

/// Encoded segments of a presented claims token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimsToken {
	/// URL-safe base64 of the canonical header.
	pub encoded_header: String,
	/// URL-safe base64 of the canonical claims.
	pub encoded_claims: String,
	/// URL-safe base64 of the signature.
	pub signature: String,
}
impl ClaimsToken {
	/// Splits a token into its three dot-separated segments.
	pub fn parse(token: &str) -> Result<Self, Rejection> {
		let mut segments = token.split('.');
		let (Some(header), Some(claims), Some(signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(Rejection::Malformed);
		};

		Ok(Self {
			encoded_header: header.to_owned(),
			encoded_claims: claims.to_owned(),
			signature: signature.to_owned(),
		})
	}

	/// Bytes covered by the signature.
	pub fn signing_input(&self) -> String {
		format!("{}.{}", self.encoded_header, self.encoded_claims)
	}
}
impl Display for ClaimsToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}.{}.{}", self.encoded_header, self.encoded_claims, self.signature)
	}
}

/// Issues and checks signed claims tokens for one authority.
#[derive(Clone, Copy, Debug)]
pub struct ClaimsTokenIssuer<'a> {
	config: &'a AuthorityConfig,
}
impl<'a> ClaimsTokenIssuer<'a> {
	/// Binds the issuer to an authority's issuer/audience identity.
	pub fn new(config: &'a AuthorityConfig) -> Self {
		Self { config }
	}

	/// Issues a token for `request` at `issued_at`.
	///
	/// The credential also comes with an access URL carrying the token as `?token=`.
	pub fn issue(
		&self,
		request: &AccessRequest,
		key: &HmacSha256Key,
		issued_at: OffsetDateTime,
	) -> Result<IssuedCredential> {
		let issued_at = scheme::whole_seconds(issued_at);
		let expires_at = request.expires_at(issued_at)?;
		let claims = Claims {
			path: request.path().to_owned(),
			exp: expires_at.unix_timestamp(),
			iat: issued_at.unix_timestamp(),
			iss: self.config.issuer.clone(),
			aud: self.config.audience.clone(),
		};
		let mut token = ClaimsToken {
			encoded_header: encoding::encode_url_safe(encoding::canonicalize(&ClaimsHeader::default())?),
			encoded_claims: encoding::encode_url_safe(encoding::canonicalize(&claims)?),
			signature: String::new(),
		};

		token.signature = encoding::encode_url_safe(key.sign(token.signing_input().as_bytes())?);

		let token = token.to_string();
		let access_url = self.config.resource_url(request.path()).ok().map(|mut url| {
			url.query_pairs_mut().append_pair("token", &token);

			url
		});

		Ok(IssuedCredential {
			scheme: Scheme::Claims,
			credential: token,
			path: claims.path,
			issued_at,
			expires_at,
			access_url,
		})
	}

	/// Parses and verifies a presented token.
	pub fn verify(
		&self,
		token: &str,
		key: &HmacSha256Key,
		now: OffsetDateTime,
	) -> Result<AccessGrant, Rejection> {
		self.verify_token(&ClaimsToken::parse(token)?, key, now)
	}

	/// Verifies already-split token segments.
	pub fn verify_token(
		&self,
		token: &ClaimsToken,
		key: &HmacSha256Key,
		now: OffsetDateTime,
	) -> Result<AccessGrant, Rejection> {
		let header = encoding::decode_json::<ClaimsHeader>(&token.encoded_header)?;

		if header != ClaimsHeader::default() {
			return Err(Rejection::Malformed);
		}

		let claims = encoding::decode_json::<Claims>(&token.encoded_claims)?;
		let issued_at = scheme::expiry_from_epoch(claims.iat)?;
		let expires_at = scheme::expiry_from_epoch(claims.exp)?;

		scheme::ensure_unexpired(expires_at, now)?;

		let signature = encoding::decode_url_safe(&token.signature)?;

		if !key.verify(token.signing_input().as_bytes(), &signature) {
			return Err(Rejection::SignatureMismatch);
		}
		if claims.iss != self.config.issuer || claims.aud != self.config.audience {
			return Err(Rejection::Malformed);
		}

		Ok(AccessGrant {
			path: claims.path,
			issued_at: Some(issued_at),
			expires_at,
			issuer: claims.iss,
			audience: claims.aud,
		})
	}
}
