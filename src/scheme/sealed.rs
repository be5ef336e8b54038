//! Compact HMAC-sealed tokens: `base64url("<path>:<expires_at>:<seal>")`.
//!
//! The seal is HMAC-SHA256 keyed by the shared sealed-token secret over
//! `<path>:<expires_at>:<secret>`, itself URL-safe base64 encoded so it never contains `:`. Fields
//! are split from the right, which keeps paths containing `:` intact. The expiry must be in its
//! canonical decimal form so one issued token has exactly one encoding.

// self
use crate::{
	_prelude::*,
	algorithm::{HmacSha256Key, Verifier},
	config::AuthorityConfig,
	encoding,
	grant::{AccessGrant, AccessRequest, IssuedCredential, Scheme},
	scheme,
	verifier::Rejection,
};

/// Decoded fields of a sealed token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedToken {
	/// Resource path the token authorizes.
	pub path: String,
	/// Expiry (epoch seconds).
	pub expires_at: i64,
	/// URL-safe base64 HMAC tag.
	pub seal: String,
}
impl SealedToken {
	/// Decodes and splits a presented token.
	pub fn parse(token: &str) -> Result<Self, Rejection> {
		let decoded = encoding::decode_url_safe(token)?;
		let text = String::from_utf8(decoded).map_err(|_| Rejection::Malformed)?;
		let mut fields = text.rsplitn(3, ':');
		let (Some(seal), Some(expires_at), Some(path)) = (fields.next(), fields.next(), fields.next())
		else {
			return Err(Rejection::Malformed);
		};
		let expires_at_field = expires_at;
		let expires_at = expires_at_field.parse::<i64>().map_err(|_| Rejection::Malformed)?;

		if expires_at_field != expires_at.to_string() || !path.starts_with('/') {
			return Err(Rejection::Malformed);
		}

		Ok(Self { path: path.to_owned(), expires_at, seal: seal.to_owned() })
	}

	/// Bytes covered by the seal: `<path>:<expires_at>:<secret>`.
	pub(crate) fn sealed_message(path: &str, expires_at: i64, key: &HmacSha256Key) -> Vec<u8> {
		let mut message = format!("{path}:{expires_at}:").into_bytes();

		message.extend_from_slice(key.secret().expose());

		message
	}

	/// Encodes the token for transport.
	pub fn encode(&self) -> String {
		encoding::encode_url_safe(format!("{}:{}:{}", self.path, self.expires_at, self.seal))
	}
}

/// Issues and checks sealed tokens for one authority.
#[derive(Clone, Copy, Debug)]
pub struct SealedTokenIssuer<'a> {
	config: &'a AuthorityConfig,
}
impl<'a> SealedTokenIssuer<'a> {
	/// Binds the issuer to an authority's issuer/audience identity.
	pub fn new(config: &'a AuthorityConfig) -> Self {
		Self { config }
	}

	/// Issues a sealed token for `request` at `issued_at`.
	pub fn issue(
		&self,
		request: &AccessRequest,
		key: &HmacSha256Key,
		issued_at: OffsetDateTime,
	) -> Result<IssuedCredential> {
		let issued_at = scheme::whole_seconds(issued_at);
		let expires_at = request.expires_at(issued_at)?;
		let epoch = expires_at.unix_timestamp();
		let tag = key.tag(&SealedToken::sealed_message(request.path(), epoch, key));
		let token = SealedToken {
			path: request.path().to_owned(),
			expires_at: epoch,
			seal: encoding::encode_url_safe(tag),
		};

		Ok(IssuedCredential {
			scheme: Scheme::Sealed,
			credential: token.encode(),
			path: token.path,
			issued_at,
			expires_at,
			access_url: None,
		})
	}

	/// Parses and verifies a presented token.
	pub fn verify(
		&self,
		token: &str,
		key: &HmacSha256Key,
		now: OffsetDateTime,
	) -> Result<AccessGrant, Rejection> {
		self.verify_token(&SealedToken::parse(token)?, key, now)
	}

	/// Verifies already-decoded token fields.
	///
	/// A seal that is not even valid base64 is still a mismatch rather than a malformed token:
	/// the token parsed, it simply was not sealed by this key.
	pub fn verify_token(
		&self,
		token: &SealedToken,
		key: &HmacSha256Key,
		now: OffsetDateTime,
	) -> Result<AccessGrant, Rejection> {
		let expires_at = scheme::expiry_from_epoch(token.expires_at)?;

		scheme::ensure_unexpired(expires_at, now)?;

		let message = SealedToken::sealed_message(&token.path, token.expires_at, key);
		let sealed =
			encoding::decode_url_safe(&token.seal).is_ok_and(|tag| key.verify(&message, &tag));

		if !sealed {
			return Err(Rejection::SignatureMismatch);
		}

		Ok(AccessGrant {
			path: token.path.clone(),
			issued_at: None,
			expires_at,
			issuer: self.config.issuer.clone(),
			audience: self.config.audience.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{_preludet::test_config, secret::SecretBytes};

	fn key(secret: &str) -> HmacSha256Key {
		HmacSha256Key::new(SecretBytes::from(secret)).expect("Test secret should be accepted.")
	}

	#[test]
	fn sealed_tokens_round_trip() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let issued_at = macros::datetime!(2025-01-01 00:00 UTC);
		let request = AccessRequest::new("/reports/q1", 2).expect("Request fixture should be valid.");
		let issued = issuer.issue(&request, &key("s3cr3t"), issued_at).expect("Issuance should succeed.");
		let grant = issuer
			.verify(&issued.credential, &key("s3cr3t"), issued_at)
			.expect("Fresh token should verify.");

		assert_eq!(grant.path, "/reports/q1");
		assert_eq!(grant.expires_at, macros::datetime!(2025-01-01 02:00 UTC));
		assert_eq!(grant.issued_at, None);

		let decoded = SealedToken::parse(&issued.credential).expect("Issued token should parse.");

		assert_eq!(decoded.expires_at, macros::datetime!(2025-01-01 02:00 UTC).unix_timestamp());
		assert_eq!(
			issuer.verify(&issued.credential, &key("s3cr3t"), macros::datetime!(2025-01-01 02:00:01 UTC)),
			Err(Rejection::Expired)
		);
	}

	#[test]
	fn wrong_hash_is_a_mismatch_not_malformed() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let before_expiry = macros::datetime!(2023-11-14 00:00 UTC);
		let token = encoding::encode_url_safe("/x:1700000000:<wronghash>");

		assert_eq!(
			issuer.verify(&token, &key("s3cr3t"), before_expiry),
			Err(Rejection::SignatureMismatch)
		);

		let forged = encoding::encode_url_safe(format!(
			"/x:1700000000:{}",
			encoding::encode_url_safe(key("guess").tag(b"/x:1700000000:guess"))
		));

		assert_eq!(
			issuer.verify(&forged, &key("s3cr3t"), before_expiry),
			Err(Rejection::SignatureMismatch)
		);
	}

	#[test]
	fn parse_failures_are_malformed() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let now = macros::datetime!(2023-11-14 00:00 UTC);

		for raw in ["/x:1700000000", "/x:soon:abc", "x:1700000000:abc", "no-fields"] {
			let token = encoding::encode_url_safe(raw);

			assert_eq!(issuer.verify(&token, &key("s3cr3t"), now), Err(Rejection::Malformed), "{raw}");
		}

		assert_eq!(issuer.verify("not base64!", &key("s3cr3t"), now), Err(Rejection::Malformed));
	}

	#[test]
	fn seal_bytes_are_pinned() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let request = AccessRequest::new("/reports/q1", 2).expect("Request fixture should be valid.");
		let issued = issuer
			.issue(&request, &key("seal-s3cr3t"), macros::datetime!(2025-01-01 00:00 UTC))
			.expect("Issuance should succeed.");
		let token = SealedToken::parse(&issued.credential).expect("Issued token should parse.");

		assert_eq!(token.expires_at, 1_735_696_800);
		assert_eq!(token.seal, "OVRyn2nsvjV7w5tH2r7BaOcCagmsati-ec_c_hYneDk");
		assert_eq!(
			issued.credential,
			"L3JlcG9ydHMvcTE6MTczNTY5NjgwMDpPVlJ5bjJuc3ZqVjd3NXRIMnI3QmFPY0NhZ21zYXRpLWVjX2NfaFluZURr"
		);
	}

	#[test]
	fn expiry_field_must_be_canonical() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let issued_at = macros::datetime!(2025-01-01 00:00 UTC);
		let request = AccessRequest::new("/x", 1).expect("Request fixture should be valid.");
		let issued = issuer.issue(&request, &key("s3cr3t"), issued_at).expect("Issuance should succeed.");
		let token = SealedToken::parse(&issued.credential).expect("Issued token should parse.");

		for expiry in [format!("+{}", token.expires_at), format!("0{}", token.expires_at)] {
			let reencoded =
				encoding::encode_url_safe(format!("{}:{expiry}:{}", token.path, token.seal));

			assert_ne!(reencoded, issued.credential);
			assert_eq!(
				issuer.verify(&reencoded, &key("s3cr3t"), issued_at),
				Err(Rejection::Malformed),
				"{expiry}"
			);
		}
	}

	#[test]
	fn sub_second_issuance_reports_whole_seconds() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let request = AccessRequest::new("/x", 1).expect("Request fixture should be valid.");
		let issued = issuer
			.issue(&request, &key("s3cr3t"), macros::datetime!(2025-01-01 00:00:00.75 UTC))
			.expect("Issuance should succeed.");
		let token = SealedToken::parse(&issued.credential).expect("Issued token should parse.");

		assert_eq!(issued.issued_at, macros::datetime!(2025-01-01 00:00 UTC));
		assert_eq!(issued.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(token.expires_at, issued.expires_at.unix_timestamp());
	}

	#[test]
	fn colons_inside_paths_survive() {
		let config = test_config();
		let issuer = SealedTokenIssuer::new(&config);
		let issued_at = macros::datetime!(2025-01-01 00:00 UTC);
		let request = AccessRequest::new("/a:b/c", 1).expect("Colon paths should be valid.");
		let issued = issuer.issue(&request, &key("s3cr3t"), issued_at).expect("Issuance should succeed.");
		let grant = issuer
			.verify(&issued.credential, &key("s3cr3t"), issued_at)
			.expect("Colon path token should verify.");

		assert_eq!(grant.path, "/a:b/c");
	}
}
