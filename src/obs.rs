//! Optional observability helpers for session operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_guard.op` with the `op` and
//!   `stage` (call site) fields.
//! - Enable `metrics` to increment the `session_guard_op_total` counter for every
//!   attempt/success/failure/supersession, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Session operations observed by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOp {
	/// Startup restore from durable storage.
	Hydrate,
	/// Credential login.
	Login,
	/// Account registration.
	Register,
	/// Session teardown.
	Logout,
}
impl SessionOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionOp::Hydrate => "hydrate",
			SessionOp::Login => "login",
			SessionOp::Register => "register",
			SessionOp::Logout => "logout",
		}
	}
}
impl Display for SessionOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a session operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Stale outcome discarded because a newer attempt took over.
	Superseded,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
			OpOutcome::Superseded => "superseded",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
