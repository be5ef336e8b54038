//! HMAC-SHA256 keyed by a shared secret.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	algorithm::{Signer, SigningAlgorithm, Verifier},
	error::SigningError,
	secret::SecretBytes,
};

type HmacSha256 = Hmac<Sha256>;

/// Shared-secret HMAC-SHA256 key.
#[derive(Clone)]
pub struct HmacSha256Key(SecretBytes);
impl HmacSha256Key {
	/// Wraps a shared secret, rejecting empty keys.
	pub fn new(secret: SecretBytes) -> Result<Self, SigningError> {
		if secret.is_empty() {
			return Err(SigningError::EmptyKey);
		}

		Ok(Self(secret))
	}

	fn mac(&self, message: &[u8]) -> HmacSha256 {
		// HMAC accepts keys of any length; only the empty key is refused up front.
		let mut mac = <HmacSha256 as Mac>::new_from_slice(self.0.expose())
			.unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));

		mac.update(message);

		mac
	}

	/// Computes the 32-byte tag for `message`.
	pub fn tag(&self, message: &[u8]) -> [u8; 32] {
		self.mac(message).finalize().into_bytes().into()
	}

	/// Raw shared secret, for schemes whose message also binds the secret.
	pub(crate) fn secret(&self) -> &SecretBytes {
		&self.0
	}
}
impl Signer for HmacSha256Key {
	fn algorithm(&self) -> SigningAlgorithm {
		SigningAlgorithm::HmacSha256
	}

	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
		Ok(self.tag(message).to_vec())
	}
}
impl Verifier for HmacSha256Key {
	fn algorithm(&self) -> SigningAlgorithm {
		SigningAlgorithm::HmacSha256
	}

	fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
		self.mac(message).verify_slice(signature).is_ok()
	}
}
impl Debug for HmacSha256Key {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HmacSha256Key(<redacted>)")
	}
}
