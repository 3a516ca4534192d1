//! Route guard admitting or redirecting navigation based on session state.

// self
use crate::{
	_prelude::*,
	auth::{Role, RoleSet},
	session::SessionSnapshot,
};

/// Default redirect target for unauthenticated navigation.
pub const DEFAULT_LOGIN_REDIRECT: &str = "/login";
/// Default redirect target for authenticated but unauthorized navigation.
pub const DEFAULT_UNAUTHORIZED_REDIRECT: &str = "/unauthorized";

/// Access requirement declared by the route table for a protected subtree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteRequirement {
	/// Any logged-in principal is admitted.
	Authenticated,
	/// Only logged-in principals whose role is in the set are admitted.
	AnyRole(RoleSet),
}
impl RouteRequirement {
	/// Requirement accepting a single role.
	pub fn role(role: Role) -> Self {
		Self::AnyRole(role.into())
	}

	/// Requirement accepting any of the provided roles.
	pub fn any_of(roles: impl Into<RoleSet>) -> Self {
		Self::AnyRole(roles.into())
	}
}

/// Why a navigation attempt was denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
	/// No usable session; the caller should authenticate first.
	Unauthenticated,
	/// The session is authenticated but its role is not acceptable.
	Unauthorized,
}

/// Redirect issued for a denied navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
	/// Why the attempt was denied.
	pub reason: DenialReason,
	/// Path the caller should navigate to instead.
	pub redirect_to: String,
	/// Originally requested path, captured so a successful login can return
	/// there. Only present for unauthenticated denials.
	pub return_to: Option<String>,
}

/// Outcome of a single navigation evaluation.
///
/// Terminal per navigation attempt; the guard re-evaluates fresh on the next
/// attempt with no memoization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardDecision {
	/// Session state is still loading; render a neutral waiting indicator and
	/// make no navigation decision yet.
	Pending,
	/// Navigation admitted; render the requested subtree.
	Admitted,
	/// Navigation denied; redirect per the carried [`Denial`].
	Denied(Denial),
}
impl GuardDecision {
	/// True if the requested subtree should render.
	pub fn is_admitted(&self) -> bool {
		matches!(self, Self::Admitted)
	}

	/// Returns the denial, when the attempt was denied.
	pub fn denial(&self) -> Option<&Denial> {
		match self {
			Self::Denied(denial) => Some(denial),
			_ => None,
		}
	}
}

/// Gates navigation to protected subtrees.
///
/// The guard holds no mutable state and never fails: an absent or malformed
/// principal (e.g. an empty token) is treated as unauthenticated, not as an
/// error. The route table mapping paths to requirements stays with the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGuard {
	login_path: String,
	unauthorized_path: String,
}
impl RouteGuard {
	/// Creates a guard with the default redirect targets.
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the login redirect target.
	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the unauthorized redirect target.
	pub fn with_unauthorized_path(mut self, path: impl Into<String>) -> Self {
		self.unauthorized_path = path.into();

		self
	}

	/// Evaluates one navigation attempt against the current session state.
	pub fn evaluate(
		&self,
		snapshot: &SessionSnapshot,
		requirement: &RouteRequirement,
		requested_path: &str,
	) -> GuardDecision {
		if snapshot.loading {
			return GuardDecision::Pending;
		}
		if !snapshot.is_authenticated() {
			return GuardDecision::Denied(Denial {
				reason: DenialReason::Unauthenticated,
				redirect_to: self.login_path.clone(),
				return_to: Some(requested_path.to_owned()),
			});
		}
		if let RouteRequirement::AnyRole(required) = requirement {
			let admitted =
				snapshot.role().is_some_and(|role| required.contains(role));

			if !admitted {
				return GuardDecision::Denied(Denial {
					reason: DenialReason::Unauthorized,
					redirect_to: self.unauthorized_path.clone(),
					return_to: None,
				});
			}
		}

		GuardDecision::Admitted
	}
}
impl Default for RouteGuard {
	fn default() -> Self {
		Self {
			login_path: DEFAULT_LOGIN_REDIRECT.into(),
			unauthorized_path: DEFAULT_UNAUTHORIZED_REDIRECT.into(),
		}
	}
}
