//! Access requests, verified grants, and the issued-credential envelope.

// self
use crate::{_prelude::*, error::InputError};

/// Credential schemes the broker can issue and verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
	/// Signed claims token (`header.claims.signature`).
	Claims,
	/// Canned-policy signed URL.
	SignedUrl,
	/// Compact HMAC-sealed token.
	Sealed,
}
impl Scheme {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Scheme::Claims => "claims",
			Scheme::SignedUrl => "signed_url",
			Scheme::Sealed => "sealed",
		}
	}
}
impl Display for Scheme {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated request for time-scoped access to a resource path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequest {
	path: String,
	duration_hours: u32,
}
impl AccessRequest {
	/// Validates and wraps a path + duration pair.
	pub fn new(path: impl Into<String>, duration_hours: u32) -> Result<Self, InputError> {
		let path = path.into();

		validate_path(&path)?;

		if duration_hours == 0 {
			return Err(InputError::ZeroDuration);
		}

		Ok(Self { path, duration_hours })
	}

	/// Parses an inbound JSON body, applying `default_hours` when no duration is given.
	///
	/// Accepts `expiration_hours` (or its alias `duration_hours`); a missing `path` means `/`.
	pub fn from_json(raw: &[u8], default_hours: u32) -> Result<Self, InputError> {
		#[derive(Deserialize)]
		struct Body {
			#[serde(default = "root_path")]
			path: String,
			#[serde(default, alias = "duration_hours")]
			expiration_hours: Option<u32>,
		}

		fn root_path() -> String {
			"/".into()
		}

		let mut de = serde_json::Deserializer::from_slice(raw);
		let body: Body = serde_path_to_error::deserialize(&mut de)?;

		Self::new(body.path, body.expiration_hours.unwrap_or(default_hours))
	}

	/// Slash-rooted resource path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Requested lifetime in hours.
	pub fn duration_hours(&self) -> u32 {
		self.duration_hours
	}

	/// Requested lifetime.
	pub fn duration(&self) -> Duration {
		Duration::hours(i64::from(self.duration_hours))
	}

	/// Expiry instant for a credential issued at `issued_at`.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Result<OffsetDateTime, InputError> {
		issued_at
			.checked_add(self.duration())
			.ok_or(InputError::DurationOutOfRange { hours: self.duration_hours })
	}
}

/// Authorization recovered from a verified credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
	/// Resource path the credential authorizes.
	pub path: String,
	/// Issuance instant, when the scheme carries one (claims tokens only).
	pub issued_at: Option<OffsetDateTime>,
	/// Instant after which the credential is rejected.
	pub expires_at: OffsetDateTime,
	/// Issuing authority.
	pub issuer: String,
	/// Protected resource domain.
	pub audience: String,
}
impl AccessGrant {
	/// Lifetime the credential was issued for, when the issuance instant is known.
	pub fn duration(&self) -> Option<Duration> {
		self.issued_at.map(|issued| self.expires_at - issued)
	}

	/// Returns `true` once `instant` is strictly past the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}
}

/// Credential produced by an issuer, plus the metadata returned to the caller.
#[derive(Clone)]
pub struct IssuedCredential {
	/// Scheme that produced the credential.
	pub scheme: Scheme,
	/// Token string or signed URL; callers must avoid logging it.
	pub credential: String,
	/// Resource path the credential authorizes.
	pub path: String,
	/// Issuance instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
	/// Ready-to-use URL carrying the credential, when the scheme has one.
	pub access_url: Option<Url>,
}
impl Debug for IssuedCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedCredential")
			.field("scheme", &self.scheme)
			.field("credential", &"<redacted>")
			.field("path", &self.path)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("access_url", &self.access_url.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Success body returned across the invocation boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResponse {
	/// Token string or signed URL.
	pub credential: String,
	/// RFC 3339 expiry timestamp.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Resource path the credential authorizes.
	pub path: String,
	/// Ready-to-use URL carrying the credential, when the scheme has one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_url: Option<Url>,
}
impl From<IssuedCredential> for AccessResponse {
	fn from(issued: IssuedCredential) -> Self {
		Self {
			credential: issued.credential,
			expires_at: issued.expires_at,
			path: issued.path,
			access_url: issued.access_url,
		}
	}
}

fn validate_path(path: &str) -> Result<(), InputError> {
	if path.is_empty() {
		return Err(InputError::EmptyPath);
	}
	if !path.starts_with('/') {
		return Err(InputError::PathNotRooted);
	}

	let forbidden = |c: char| {
		!c.is_ascii_graphic()
			|| matches!(c, '?' | '#' | '\\' | '"' | '<' | '>' | '`' | '{' | '}' | '^')
	};

	if let Some(character) = path.chars().find(|&c| forbidden(c)) {
		return Err(InputError::PathForbiddenCharacter { character });
	}
	if path.split('/').any(is_dot_segment) {
		return Err(InputError::PathNotCanonical);
	}

	Ok(())
}

// URL parsers treat `%2e` as `.` when resolving segments.
fn is_dot_segment(segment: &str) -> bool {
	matches!(segment.to_ascii_lowercase().replace("%2e", ".").as_str(), "." | "..")
}
