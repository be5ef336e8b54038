// self
use crate::obs::{Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(op: Operation, scheme: &'static str, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"access_broker_op_total",
			"op" => op.as_str(),
			"scheme" => scheme,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, scheme, outcome);
	}
}
