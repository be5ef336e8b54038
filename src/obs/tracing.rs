// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + scheme label.
	pub fn new(op: Operation, scheme: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("access_broker.op", op = op.as_str(), scheme);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, scheme);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `warn` event for an operation that ended in an error.
///
/// Only the error kind and its display text are logged; error messages never carry key bytes.
pub fn log_failure(op: Operation, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(op = op.as_str(), kind = err.kind(), error = %err, "Operation failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, err);
	}
}

/// Emits a `warn` event for a rejected credential.
pub fn log_rejection(reason: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason, "Credential rejected.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}
