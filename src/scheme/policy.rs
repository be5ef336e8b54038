//! Canned-policy signed URLs.
//!
//! The policy document is the fixed single-statement layout CDN edges understand:
//!
//! ```json
//! {"Statement":[{"Resource":"<url>","Condition":{"DateLessThan":{"AWS:EpochTime":<exp>}}}]}
//! ```
//!
//! It is signed with RSASSA-PKCS1-v1_5 / SHA-256 so that a third party holding only the public
//! key can check it. The signed URL carries the policy, the signature, and the key pair id as
//! `Policy`, `Signature`, and `Key-Pair-Id` query parameters.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	algorithm::{RsaSigningKey, RsaVerifyingKey, Signer, Verifier},
	config::AuthorityConfig,
	encoding,
	error::{InputError, SigningError},
	grant::{AccessGrant, AccessRequest, IssuedCredential, Scheme},
	scheme,
	verifier::Rejection,
};

const POLICY_PARAM: &str = "Policy";
const SIGNATURE_PARAM: &str = "Signature";
const KEY_PAIR_ID_PARAM: &str = "Key-Pair-Id";

/// Resource-access statement covered by a policy signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyStatement {
	/// Absolute URL the statement grants access to.
	pub resource: Url,
	/// Expiry in epoch seconds.
	pub expires_at: i64,
}
impl PolicyStatement {
	/// Canonical JSON bytes the signature covers.
	pub fn canonical_bytes(&self) -> Result<Vec<u8>, SigningError> {
		encoding::canonicalize(&PolicyDocument::from(self))
	}

	fn from_document(doc: PolicyDocument) -> Result<Self, Rejection> {
		let [statement] =
			<[PolicyEntry; 1]>::try_from(doc.statement).map_err(|_| Rejection::Malformed)?;
		let resource = Url::parse(&statement.resource).map_err(|_| Rejection::Malformed)?;

		Ok(Self { resource, expires_at: statement.condition.date_less_than.epoch_time })
	}
}

#[derive(Serialize, Deserialize)]
struct PolicyDocument {
	#[serde(rename = "Statement")]
	statement: Vec<PolicyEntry>,
}
impl From<&PolicyStatement> for PolicyDocument {
	fn from(statement: &PolicyStatement) -> Self {
		Self {
			statement: vec![PolicyEntry {
				resource: statement.resource.to_string(),
				condition: PolicyCondition {
					date_less_than: EpochTime { epoch_time: statement.expires_at },
				},
			}],
		}
	}
}

#[derive(Serialize, Deserialize)]
struct PolicyEntry {
	#[serde(rename = "Resource")]
	resource: String,
	#[serde(rename = "Condition")]
	condition: PolicyCondition,
}

#[derive(Serialize, Deserialize)]
struct PolicyCondition {
	#[serde(rename = "DateLessThan")]
	date_less_than: EpochTime,
}

#[derive(Serialize, Deserialize)]
struct EpochTime {
	#[serde(rename = "AWS:EpochTime")]
	epoch_time: i64,
}

/// Policy, signature, and key pair id bound to a resource URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPolicy {
	/// Resource URL the credential is presented on (without signing parameters).
	pub resource: Url,
	/// URL-safe base64 of the canonical policy JSON.
	pub encoded_policy: String,
	/// URL-safe base64 of the RSA signature.
	pub signature: String,
	/// Identifier of the key pair whose private half signed the policy.
	pub key_pair_id: String,
}
impl SignedPolicy {
	/// Renders the signed URL.
	pub fn to_url(&self) -> Url {
		let mut url = self.resource.clone();

		url.query_pairs_mut()
			.append_pair(POLICY_PARAM, &self.encoded_policy)
			.append_pair(SIGNATURE_PARAM, &self.signature)
			.append_pair(KEY_PAIR_ID_PARAM, &self.key_pair_id);

		url
	}

	/// Splits a presented signed URL into its resource and signing parameters.
	///
	/// Each signing parameter must appear exactly once. Every other query piece is kept exactly as
	/// presented, so the resource compares byte for byte with the one that was signed.
	pub fn from_url(presented: &str) -> Result<Self, Rejection> {
		let url = Url::parse(presented).map_err(|_| Rejection::Malformed)?;
		let mut policy = None;
		let mut signature = None;
		let mut key_pair_id = None;
		let mut rest = Vec::new();

		for piece in url.query().into_iter().flat_map(|query| query.split('&')) {
			let Some((name, value)) = form_urlencoded::parse(piece.as_bytes()).next() else {
				rest.push(piece);

				continue;
			};
			let slot = match name.as_ref() {
				POLICY_PARAM => &mut policy,
				SIGNATURE_PARAM => &mut signature,
				KEY_PAIR_ID_PARAM => &mut key_pair_id,
				_ => {
					rest.push(piece);

					continue;
				},
			};

			if slot.replace(value.into_owned()).is_some() {
				return Err(Rejection::Malformed);
			}
		}

		let (Some(encoded_policy), Some(signature), Some(key_pair_id)) =
			(policy, signature, key_pair_id)
		else {
			return Err(Rejection::Malformed);
		};
		let rest = rest.join("&");
		let mut resource = url.clone();

		resource.set_fragment(None);
		resource.set_query((!rest.is_empty()).then_some(rest.as_str()));

		Ok(Self { resource, encoded_policy, signature, key_pair_id })
	}
}

/// Issues and checks canned-policy signed URLs for one authority.
#[derive(Clone, Copy, Debug)]
pub struct PolicySigner<'a> {
	config: &'a AuthorityConfig,
}
impl<'a> PolicySigner<'a> {
	/// Binds the signer to an authority's origin and key pair id.
	pub fn new(config: &'a AuthorityConfig) -> Self {
		Self { config }
	}

	/// Signs a policy granting access to `resource` until `expires_at`.
	///
	/// Input is validated before any cryptographic work: `resource` must be an absolute URL with
	/// a host and no fragment, and `expires_at` must lie strictly after `issued_at`. An empty
	/// query (`?` alone) is dropped.
	pub fn sign(
		&self,
		resource: &str,
		expires_at: OffsetDateTime,
		key: &RsaSigningKey,
		issued_at: OffsetDateTime,
	) -> Result<SignedPolicy> {
		let mut resource =
			Url::parse(resource).map_err(|source| InputError::NotAbsoluteUrl { source })?;

		if resource.host_str().is_none() {
			return Err(InputError::MissingHost.into());
		}
		if resource.fragment().is_some() {
			return Err(InputError::ResourceHasFragment.into());
		}
		if resource.query() == Some("") {
			resource.set_query(None);
		}
		if expires_at.unix_timestamp() <= issued_at.unix_timestamp() {
			return Err(InputError::ExpiryNotInFuture.into());
		}

		let statement = PolicyStatement { resource, expires_at: expires_at.unix_timestamp() };
		let canonical = statement.canonical_bytes()?;
		let signature = key.sign(&canonical)?;

		Ok(SignedPolicy {
			resource: statement.resource,
			encoded_policy: encoding::encode_url_safe(&canonical),
			signature: encoding::encode_url_safe(signature),
			key_pair_id: self.config.key_pair_id.clone(),
		})
	}

	/// Issues a signed URL for `request`, resolving its path against the configured origin.
	///
	/// The path must come out of URL parsing unchanged; otherwise the URL would authorize a
	/// different path than the one requested.
	pub fn issue(
		&self,
		request: &AccessRequest,
		key: &RsaSigningKey,
		issued_at: OffsetDateTime,
	) -> Result<IssuedCredential> {
		let issued_at = scheme::whole_seconds(issued_at);
		let expires_at = request.expires_at(issued_at)?;
		let resource = self
			.config
			.resource_url(request.path())
			.map_err(|source| InputError::NotAbsoluteUrl { source })?;

		if resource.path() != request.path() {
			return Err(InputError::PathNotCanonical.into());
		}
		let url = self.sign(resource.as_str(), expires_at, key, issued_at)?.to_url();

		Ok(IssuedCredential {
			scheme: Scheme::SignedUrl,
			credential: url.to_string(),
			path: request.path().to_owned(),
			issued_at,
			expires_at,
			access_url: Some(url),
		})
	}

	/// Parses and verifies a presented signed URL.
	pub fn verify(
		&self,
		presented: &str,
		key: &RsaVerifyingKey,
		now: OffsetDateTime,
	) -> Result<AccessGrant, Rejection> {
		self.verify_signed(&SignedPolicy::from_url(presented)?, key, now)
	}

	/// Verifies an already-parsed signed URL.
	///
	/// The policy must name exactly the URL it was presented on.
	pub fn verify_signed(
		&self,
		signed: &SignedPolicy,
		key: &RsaVerifyingKey,
		now: OffsetDateTime,
	) -> Result<AccessGrant, Rejection> {
		let doc = encoding::decode_json::<PolicyDocument>(&signed.encoded_policy)?;
		let statement = PolicyStatement::from_document(doc)?;
		let expires_at = scheme::expiry_from_epoch(statement.expires_at)?;

		scheme::ensure_unexpired(expires_at, now)?;

		let signature = encoding::decode_url_safe(&signed.signature)?;
		let canonical = statement.canonical_bytes().map_err(|_| Rejection::Malformed)?;

		if signed.key_pair_id != self.config.key_pair_id || !key.verify(&canonical, &signature) {
			return Err(Rejection::SignatureMismatch);
		}
		if statement.resource != signed.resource {
			return Err(Rejection::SignatureMismatch);
		}

		Ok(AccessGrant {
			path: statement.resource.path().to_owned(),
			issued_at: None,
			expires_at,
			issuer: self.config.issuer.clone(),
			audience: self.config.audience.clone(),
		})
	}
}
