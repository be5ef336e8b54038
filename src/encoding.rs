//! Deterministic canonicalization and URL-safe base64 shared by every credential scheme.
//!
//! Signatures cover the exact bytes produced here, so the encoding is fixed: compact JSON with
//! fields emitted in declaration order (no whitespace, UTF-8) and base64 with the URL-safe
//! alphabet and no padding. Decoding rejects padded input instead of guessing.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::SigningError, verifier::Rejection};

/// Serializes `value` into its canonical byte form.
///
/// Only structs (never hash maps) flow through here so field order is fixed by the type.
pub fn canonicalize<T>(value: &T) -> Result<Vec<u8>, SigningError>
where
	T: ?Sized + Serialize,
{
	serde_json::to_vec(value).map_err(SigningError::Canonicalize)
}

/// Encodes bytes with the URL-safe alphabet and no padding.
pub fn encode_url_safe(bytes: impl AsRef<[u8]>) -> String {
	URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes an unpadded URL-safe base64 string.
pub fn decode_url_safe(encoded: &str) -> Result<Vec<u8>, Rejection> {
	URL_SAFE_NO_PAD.decode(encoded).map_err(|_| Rejection::Malformed)
}

/// Decodes a URL-safe base64 segment and parses it as JSON.
pub(crate) fn decode_json<T>(encoded: &str) -> Result<T, Rejection>
where
	T: serde::de::DeserializeOwned,
{
	let bytes = decode_url_safe(encoded)?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut de).map_err(|_| Rejection::Malformed)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Sample {
		path: String,
		exp: i64,
		aud: String,
	}

	#[test]
	fn canonical_form_ignores_construction_path() {
		let literal = Sample { path: "/reports/q1".into(), exp: 1_735_696_800, aud: "a".into() };
		let parsed: Sample =
			serde_json::from_str("{ \"aud\": \"a\",\n \"exp\": 1735696800, \"path\": \"/reports/q1\" }")
				.expect("Reordered JSON should parse.");

		assert_eq!(
			canonicalize(&literal).expect("Literal should canonicalize."),
			canonicalize(&parsed).expect("Parsed value should canonicalize."),
		);
		assert_eq!(
			canonicalize(&literal).expect("Literal should canonicalize."),
			br#"{"path":"/reports/q1","exp":1735696800,"aud":"a"}"#,
		);
	}

	#[test]
	fn url_safe_alphabet_without_padding() {
		let encoded = encode_url_safe([0xfb, 0xff, 0xfe]);

		assert_eq!(encoded, "-__-");
		assert_eq!(encode_url_safe(b"a"), "YQ");
		assert_eq!(decode_url_safe("YQ").expect("Unpadded input should decode."), b"a");
	}

	#[test]
	fn decode_rejects_padding_and_foreign_alphabet() {
		assert_eq!(decode_url_safe("YQ=="), Err(Rejection::Malformed));
		assert_eq!(decode_url_safe("+/+/"), Err(Rejection::Malformed));
		assert_eq!(decode_url_safe("a.b"), Err(Rejection::Malformed));
	}
}
