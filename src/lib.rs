//! Time-scoped access credentials for protected resource paths: signed claims tokens,
//! canned-policy signed URLs, and HMAC-sealed tokens behind one stateless verifier.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod algorithm;
pub mod broker;
pub mod clock;
pub mod config;
pub mod encoding;
pub mod error;
pub mod grant;
pub mod obs;
pub mod scheme;
pub mod secret;
pub mod verifier;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use time::macros;
	// self
	use crate::{
		algorithm::{RsaSigningKey, RsaVerifyingKey},
		broker::AccessBroker,
		clock::FixedClock,
		config::AuthorityConfig,
		secret::{MemorySecrets, SecretBytes},
	};

	/// Shared claims-token secret registered by [`build_test_broker`].
	pub const CLAIMS_SECRET: &str = "s3cr3t";
	/// Shared sealed-token secret registered by [`build_test_broker`].
	pub const SEALED_SECRET: &str = "seal-s3cr3t";
	/// PKCS#8 PEM private key used for policy signing in tests.
	pub const POLICY_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/policy_key.pem");
	/// SPKI PEM public key matching [`POLICY_PRIVATE_KEY_PEM`].
	pub const POLICY_PUBLIC_KEY_PEM: &str = include_str!("../tests/fixtures/policy_key.pub.pem");
	/// SPKI PEM public key of an unrelated key pair.
	pub const OTHER_PUBLIC_KEY_PEM: &str = include_str!("../tests/fixtures/other_key.pub.pem");

	/// Authority configuration mirroring the staging deployment.
	pub fn test_config() -> AuthorityConfig {
		AuthorityConfig::builder("staging-access-control", "staging.robertconsulting.net")
			.origin(
				Url::parse("https://staging.robertconsulting.net")
					.expect("Staging origin fixture should parse."),
			)
			.key_pair_id("K2JCJMDEHXQW47")
			.build()
			.expect("Staging configuration fixture should build.")
	}

	/// Parses the policy signing key fixture.
	pub fn policy_signing_key() -> RsaSigningKey {
		RsaSigningKey::from_pem(&SecretBytes::from(POLICY_PRIVATE_KEY_PEM))
			.expect("Policy private key fixture should parse.")
	}

	/// Parses the unrelated public key fixture.
	pub fn other_verifying_key() -> RsaVerifyingKey {
		RsaVerifyingKey::from_pem(&SecretBytes::from(OTHER_PUBLIC_KEY_PEM))
			.expect("Unrelated public key fixture should parse.")
	}

	/// In-memory secrets holding every key [`test_config`] names.
	pub fn test_secrets() -> MemorySecrets {
		let names = test_config().secrets;

		MemorySecrets::default()
			.with_secret(names.claims_secret, CLAIMS_SECRET)
			.with_secret(names.sealed_secret, SEALED_SECRET)
			.with_secret(names.policy_private_key, POLICY_PRIVATE_KEY_PEM)
			.with_secret(names.policy_public_key, POLICY_PUBLIC_KEY_PEM)
	}

	/// Constructs an [`AccessBroker`] backed by [`test_secrets`] and a clock frozen at
	/// 2025-01-01T00:00:00Z.
	pub fn build_test_broker() -> (AccessBroker, Arc<MemorySecrets>, Arc<FixedClock>) {
		let secrets = Arc::new(test_secrets());
		let clock = Arc::new(FixedClock::new(macros::datetime!(2025-01-01 00:00 UTC)));
		let broker = AccessBroker::with_clock(test_config(), secrets.clone(), clock.clone());

		(broker, secrets, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use time;
pub use url;
#[cfg(test)] use {color_eyre as _, rand as _};
