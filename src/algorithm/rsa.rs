//! RSASSA-PKCS1-v1_5 / SHA-256 keys loaded from PEM.

// crates.io
use rsa::{
	Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey,
	pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
	pkcs8::{DecodePrivateKey, DecodePublicKey},
};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	algorithm::{Signer, SigningAlgorithm, Verifier},
	error::SigningError,
	secret::SecretBytes,
};

/// RSA private key used for RSASSA-PKCS1-v1_5 / SHA-256 signatures.
#[derive(Clone)]
pub struct RsaSigningKey(RsaPrivateKey);
impl RsaSigningKey {
	/// Parses a PEM private key in PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) form.
	pub fn from_pem(pem: &SecretBytes) -> Result<Self, SigningError> {
		let text = pem_text(pem)?;
		let key = RsaPrivateKey::from_pkcs8_pem(text)
			.or_else(|_| RsaPrivateKey::from_pkcs1_pem(text))
			.map_err(|_| SigningError::MalformedKey)?;

		Ok(Self(key))
	}

	/// Derives the matching public key.
	pub fn verifying_key(&self) -> RsaVerifyingKey {
		RsaVerifyingKey(self.0.to_public_key())
	}
}
impl Signer for RsaSigningKey {
	fn algorithm(&self) -> SigningAlgorithm {
		SigningAlgorithm::RsaPkcs1Sha256
	}

	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
		let digest = Sha256::digest(message);

		self.0.sign(Pkcs1v15Sign::new::<Sha256>(), &digest).map_err(SigningError::Rsa)
	}
}
impl Debug for RsaSigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RsaSigningKey(<redacted>)")
	}
}

/// RSA public key used to check canned-policy signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaVerifyingKey(RsaPublicKey);
impl RsaVerifyingKey {
	/// Parses a PEM public key in SPKI (`PUBLIC KEY`) or PKCS#1 (`RSA PUBLIC KEY`) form.
	pub fn from_pem(pem: &SecretBytes) -> Result<Self, SigningError> {
		let text = pem_text(pem)?;
		let key = RsaPublicKey::from_public_key_pem(text)
			.or_else(|_| RsaPublicKey::from_pkcs1_pem(text))
			.map_err(|_| SigningError::MalformedKey)?;

		Ok(Self(key))
	}
}
impl Verifier for RsaVerifyingKey {
	fn algorithm(&self) -> SigningAlgorithm {
		SigningAlgorithm::RsaPkcs1Sha256
	}

	fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
		let digest = Sha256::digest(message);

		self.0.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature).is_ok()
	}
}

fn pem_text(pem: &SecretBytes) -> Result<&str, SigningError> {
	if pem.is_empty() {
		return Err(SigningError::EmptyKey);
	}

	let text = std::str::from_utf8(pem.expose()).map_err(|_| SigningError::MalformedKey)?;

	Ok(text.trim())
}
