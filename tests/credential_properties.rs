// crates.io
use rand::{Rng, SeedableRng, rngs::StdRng};
use time::{Duration, OffsetDateTime, macros};
// self
use access_broker::{
	algorithm::{HmacSha256Key, RsaSigningKey},
	config::AuthorityConfig,
	encoding,
	error::{Error, InputError},
	grant::{AccessRequest, IssuedCredential, Scheme},
	scheme::{
		ClaimsToken, ClaimsTokenIssuer, PolicySigner, SealedToken, SealedTokenIssuer, SignedPolicy,
	},
	secret::SecretBytes,
	url::Url,
	verifier::{CredentialVerifier, VerificationKeys, Verdict},
};

const POLICY_PRIVATE_KEY_PEM: &str = include_str!("fixtures/policy_key.pem");
const ISSUED_AT: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);
const MUTATIONS: usize = 1_000;

struct Authority {
	config: AuthorityConfig,
	claims: HmacSha256Key,
	sealed: HmacSha256Key,
	policy: RsaSigningKey,
}
impl Authority {
	fn staging() -> Self {
		let config =
			AuthorityConfig::builder("staging-access-control", "staging.robertconsulting.net")
				.origin(
					Url::parse("https://staging.robertconsulting.net")
						.expect("Staging origin should parse for property tests."),
				)
				.key_pair_id("K2JCJMDEHXQW47")
				.build()
				.expect("Staging configuration should build for property tests.");

		Self {
			config,
			claims: HmacSha256Key::new(SecretBytes::from("s3cr3t"))
				.expect("Claims secret should be accepted."),
			sealed: HmacSha256Key::new(SecretBytes::from("seal-s3cr3t"))
				.expect("Sealed secret should be accepted."),
			policy: RsaSigningKey::from_pem(&SecretBytes::from(POLICY_PRIVATE_KEY_PEM))
				.expect("Policy key fixture should parse."),
		}
	}

	fn keys(&self) -> VerificationKeys {
		VerificationKeys {
			claims: Some(self.claims.clone()),
			sealed: Some(self.sealed.clone()),
			policy: Some(self.policy.verifying_key()),
		}
	}

	fn issue(&self, scheme: Scheme, path: &str, hours: u32) -> IssuedCredential {
		let request = AccessRequest::new(path, hours).expect("Property request should be valid.");
		let issued = match scheme {
			Scheme::Claims =>
				ClaimsTokenIssuer::new(&self.config).issue(&request, &self.claims, ISSUED_AT),
			Scheme::Sealed =>
				SealedTokenIssuer::new(&self.config).issue(&request, &self.sealed, ISSUED_AT),
			Scheme::SignedUrl =>
				PolicySigner::new(&self.config).issue(&request, &self.policy, ISSUED_AT),
		};

		issued.expect("Property issuance should succeed.")
	}

	fn verify(&self, presented: &str, now: OffsetDateTime) -> Verdict {
		CredentialVerifier::new(&self.config).verify(presented, &self.keys(), now)
	}
}

/// Rewrites the decoded signature bytes of a credential and re-encodes it, so the result still
/// parses and only the signature is wrong.
fn with_signature(issued: &IssuedCredential, edit: impl FnOnce(&mut Vec<u8>)) -> String {
	match issued.scheme {
		Scheme::Claims => {
			let mut token =
				ClaimsToken::parse(&issued.credential).expect("Issued token should parse.");
			let mut bytes =
				encoding::decode_url_safe(&token.signature).expect("Signature should decode.");

			edit(&mut bytes);
			token.signature = encoding::encode_url_safe(bytes);

			token.to_string()
		},
		Scheme::Sealed => {
			let mut token =
				SealedToken::parse(&issued.credential).expect("Issued token should parse.");
			let mut bytes = encoding::decode_url_safe(&token.seal).expect("Seal should decode.");

			edit(&mut bytes);
			token.seal = encoding::encode_url_safe(bytes);

			token.encode()
		},
		Scheme::SignedUrl => {
			let mut signed =
				SignedPolicy::from_url(&issued.credential).expect("Issued URL should parse.");
			let mut bytes =
				encoding::decode_url_safe(&signed.signature).expect("Signature should decode.");

			edit(&mut bytes);
			signed.signature = encoding::encode_url_safe(bytes);

			signed.to_url().to_string()
		},
	}
}

#[test]
fn single_byte_signature_mutations_are_rejected() {
	let authority = Authority::staging();
	let mut rng = StdRng::seed_from_u64(0x5eed);

	for scheme in [Scheme::Claims, Scheme::Sealed, Scheme::SignedUrl] {
		let issued = authority.issue(scheme, "/reports/q1", 2);
		let mut mismatches = 0;

		for _ in 0..MUTATIONS {
			let forged = with_signature(&issued, |bytes| {
				let index = rng.random_range(0..bytes.len());
				let mask = rng.random_range(1..=u8::MAX);

				bytes[index] ^= mask;
			});

			if authority.verify(&forged, ISSUED_AT) == Verdict::SignatureMismatch {
				mismatches += 1;
			}
		}

		assert!(
			mismatches * 1_000 >= MUTATIONS * 999,
			"{scheme}: only {mismatches}/{MUTATIONS} mutations were caught"
		);
	}
}

#[test]
fn truncated_signatures_are_rejected() {
	let authority = Authority::staging();

	for scheme in [Scheme::Claims, Scheme::Sealed, Scheme::SignedUrl] {
		let issued = authority.issue(scheme, "/reports/q1", 2);
		let forged = with_signature(&issued, |bytes| bytes.truncate(bytes.len() / 2));

		assert_eq!(authority.verify(&forged, ISSUED_AT), Verdict::SignatureMismatch, "{scheme}");
	}
}

#[test]
fn expiry_is_reported_regardless_of_signature() {
	let authority = Authority::staging();
	let after_expiry = ISSUED_AT + Duration::hours(2) + Duration::seconds(1);

	for scheme in [Scheme::Claims, Scheme::Sealed, Scheme::SignedUrl] {
		let issued = authority.issue(scheme, "/reports/q1", 2);
		let forged = with_signature(&issued, |bytes| bytes[0] ^= 0xff);

		assert_eq!(authority.verify(&forged, ISSUED_AT), Verdict::SignatureMismatch, "{scheme}");
		assert_eq!(authority.verify(&forged, after_expiry), Verdict::Expired, "{scheme}");
		assert_eq!(authority.verify(&issued.credential, after_expiry), Verdict::Expired, "{scheme}");
	}
}

#[test]
fn round_trips_hold_across_paths_and_durations() {
	let authority = Authority::staging();
	let mut rng = StdRng::seed_from_u64(42);
	let segments =
		["reports", "q1", "docs", "a:b", "handbook.pdf", "2025", "caf%C3%A9", ".well-known", ""];

	for _ in 0..32 {
		let depth = rng.random_range(1..=4);
		let path = (0..depth)
			.map(|_| segments[rng.random_range(0..segments.len())])
			.fold(String::new(), |path, segment| format!("{path}/{segment}"));
		let hours = rng.random_range(1..=720);

		for scheme in [Scheme::Claims, Scheme::Sealed, Scheme::SignedUrl] {
			let issued = authority.issue(scheme, &path, hours);
			let verdict = authority.verify(&issued.credential, ISSUED_AT + Duration::minutes(1));
			let grant = verdict.grant().expect("Fresh credential should verify.");

			assert_eq!(grant.path, path, "{scheme}");
			assert_eq!(grant.expires_at, ISSUED_AT + Duration::hours(i64::from(hours)), "{scheme}");
		}
	}
}

#[test]
fn tampered_payloads_are_mismatches() {
	let authority = Authority::staging();
	let sealed = authority.issue(Scheme::Sealed, "/reports/q1", 2);
	let mut token = SealedToken::parse(&sealed.credential).expect("Issued token should parse.");

	token.path = "/reports/q2".into();

	assert_eq!(authority.verify(&token.encode(), ISSUED_AT), Verdict::SignatureMismatch);

	let mut token = SealedToken::parse(&sealed.credential).expect("Issued token should parse.");

	token.expires_at += 3_600;

	assert_eq!(authority.verify(&token.encode(), ISSUED_AT), Verdict::SignatureMismatch);

	let signed_url = authority.issue(Scheme::SignedUrl, "/reports/q1", 2);
	let mut signed =
		SignedPolicy::from_url(&signed_url.credential).expect("Issued URL should parse.");

	signed.resource.set_path("/reports/q2");

	assert_eq!(authority.verify(signed.to_url().as_str(), ISSUED_AT), Verdict::SignatureMismatch);

	let mut signed =
		SignedPolicy::from_url(&signed_url.credential).expect("Issued URL should parse.");

	signed.key_pair_id = "APKAOTHERKEY".into();

	assert_eq!(authority.verify(signed.to_url().as_str(), ISSUED_AT), Verdict::SignatureMismatch);
}

#[test]
fn paths_url_parsing_would_rewrite_are_refused_by_every_scheme() {
	let authority = Authority::staging();
	let issued_at = ISSUED_AT;

	for path in ["/café", "/a/../b", "/a/./b", "/a\\b", "/x/%2e%2e/y", "/x/.%2E/y"] {
		let request = AccessRequest::new(path, 1);

		assert!(
			matches!(
				request,
				Err(InputError::PathForbiddenCharacter { .. } | InputError::PathNotCanonical)
			),
			"{path:?}"
		);
	}

	// Already-normalized paths come back byte for byte from every scheme.
	for path in ["/caf%C3%A9", "/a/..b", "/docs//handbook.pdf"] {
		for scheme in [Scheme::Claims, Scheme::Sealed, Scheme::SignedUrl] {
			let issued = authority.issue(scheme, path, 1);
			let verdict = authority.verify(&issued.credential, issued_at);

			assert_eq!(issued.path, path, "{scheme}");
			assert_eq!(verdict.grant().map(|grant| grant.path.as_str()), Some(path), "{scheme}");
		}
	}

	let err = PolicySigner::new(&authority.config)
		.sign(
			"https://staging.robertconsulting.net/x#top",
			issued_at + Duration::hours(1),
			&authority.policy,
			issued_at,
		)
		.expect_err("Fragments must be refused.");

	assert!(matches!(err, Error::InvalidInput(InputError::ResourceHasFragment)));
}

#[test]
fn signed_resources_keep_their_query() {
	let authority = Authority::staging();
	let signer = PolicySigner::new(&authority.config);

	for resource in [
		"https://staging.robertconsulting.net/x?flag",
		"https://staging.robertconsulting.net/x?a=b%20c&z=1",
	] {
		let signed = signer
			.sign(resource, ISSUED_AT + Duration::hours(1), &authority.policy, ISSUED_AT)
			.expect("Signing should succeed.");
		let verdict = authority.verify(signed.to_url().as_str(), ISSUED_AT);

		assert!(verdict.is_valid(), "{resource}: {verdict:?}");
	}
}

#[test]
fn sealed_tokens_have_one_encoding() {
	let authority = Authority::staging();
	let issued = authority.issue(Scheme::Sealed, "/x", 1);
	let token = SealedToken::parse(&issued.credential).expect("Issued token should parse.");

	for expiry in [format!("+{}", token.expires_at), format!("00{}", token.expires_at)] {
		let reencoded = encoding::encode_url_safe(format!("{}:{expiry}:{}", token.path, token.seal));

		assert_eq!(authority.verify(&reencoded, ISSUED_AT), Verdict::Malformed, "{expiry}");
	}
}
