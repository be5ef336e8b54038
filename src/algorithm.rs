//! Signing capabilities shared by the credential schemes.
//!
//! Each scheme binds to exactly one concrete key type, so a symmetric MAC can never stand in for
//! an asymmetric signature (or the other way round) without a type error:
//!
//! - [`HmacSha256Key`] seals claims tokens and sealed tokens with a shared secret.
//! - [`RsaSigningKey`] / [`RsaVerifyingKey`] sign and verify canned policies for third parties
//!   that only hold the public key.

pub mod hmac;
pub mod rsa;

pub use self::{hmac::*, rsa::*};

// self
use crate::{_prelude::*, error::SigningError};

/// Signature algorithms supported by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
	/// HMAC with SHA-256 keyed by a shared secret.
	#[serde(rename = "HS256")]
	HmacSha256,
	/// RSASSA-PKCS1-v1_5 with SHA-256.
	#[serde(rename = "RS256")]
	RsaPkcs1Sha256,
}
impl SigningAlgorithm {
	/// Returns the JOSE identifier for the algorithm.
	pub const fn as_str(self) -> &'static str {
		match self {
			SigningAlgorithm::HmacSha256 => "HS256",
			SigningAlgorithm::RsaPkcs1Sha256 => "RS256",
		}
	}
}
impl Display for SigningAlgorithm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Produces signatures over canonical bytes.
pub trait Signer
where
	Self: Send + Sync,
{
	/// Algorithm this key signs with.
	fn algorithm(&self) -> SigningAlgorithm;

	/// Signs `message`, returning the raw signature bytes.
	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Checks signatures over canonical bytes.
pub trait Verifier
where
	Self: Send + Sync,
{
	/// Algorithm this key verifies.
	fn algorithm(&self) -> SigningAlgorithm;

	/// Returns `true` if `signature` is valid for `message`. Implementations compare in
	/// constant time.
	fn verify(&self, message: &[u8], signature: &[u8]) -> bool;
}
