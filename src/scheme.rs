//! Credential schemes: canned-policy signed URLs, signed claims tokens, and sealed tokens.
//!
//! Every scheme follows the same shape. Issuance validates the [`AccessRequest`], derives the
//! expiry from the issuance instant, canonicalizes the payload, and seals it with the key type
//! the scheme is bound to. Verification parses the presented form (anything unparseable is
//! [`Rejection::Malformed`]), checks the expiry on its own, and only then checks the
//! signature, so an expired credential reports [`Rejection::Expired`] whether or not its
//! signature is intact.
//!
//! [`AccessRequest`]: crate::grant::AccessRequest
//! [`Rejection::Malformed`]: crate::verifier::Rejection::Malformed
//! [`Rejection::Expired`]: crate::verifier::Rejection::Expired

pub mod claims;
pub mod policy;
pub mod sealed;

pub use claims::*;
pub use policy::*;
pub use sealed::*;

// self
use crate::{_prelude::*, verifier::Rejection};

/// Drops sub-second precision so the reported instants match the epoch seconds on the wire.
pub(crate) fn whole_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

/// Converts an epoch-seconds expiry back into an instant.
pub(crate) fn expiry_from_epoch(epoch: i64) -> Result<OffsetDateTime, Rejection> {
	OffsetDateTime::from_unix_timestamp(epoch).map_err(|_| Rejection::Malformed)
}

/// Fails with [`Rejection::Expired`] once `now` is strictly past `expires_at`.
pub(crate) fn ensure_unexpired(
	expires_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<(), Rejection> {
	if now > expires_at {
		return Err(Rejection::Expired);
	}

	Ok(())
}
