//! Optional observability helpers for provider flows and the resource guard.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth1_provider.flow` with the `flow` and
//!   `stage` fields, plus debug events describing why a request was rejected.
//! - Enable `metrics` to increment the `oauth1_provider_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Entry points observed by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Request-token issuance.
	RequestToken,
	/// Resource-owner consent (details and decision).
	Authorization,
	/// Verifier-for-access-token exchange.
	AccessToken,
	/// Signed call to a protected resource.
	ProtectedResource,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::RequestToken => "request_token",
			FlowKind::Authorization => "authorization",
			FlowKind::AccessToken => "access_token",
			FlowKind::ProtectedResource => "protected_resource",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a provider entry point.
	Attempt,
	/// Request completed without a rejection.
	Success,
	/// Request was rejected or the store failed.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
