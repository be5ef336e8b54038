//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `access_broker.op` with the `op` (issue or
//!   verify) and `scheme` fields, plus `warn` events for failures and rejections.
//! - Enable `metrics` to increment the `access_broker_op_total` counter for every
//!   attempt/success/failure and every verification verdict, labeled by `op` + `scheme` +
//!   `outcome`.
//!
//! Nothing recorded here ever includes secret material or the presented credential.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Broker operations observed by spans and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Credential issuance.
	Issue,
	/// Credential verification.
	Verify,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Issue => "issue",
			Operation::Verify => "verify",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful issuance.
	Success,
	/// Error propagated back to the caller.
	Failure,
	/// Verification finished with the given verdict label.
	Verdict(&'static str),
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
			Outcome::Verdict(label) => label,
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
