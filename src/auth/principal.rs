//! Principal record, lifecycle helpers, and builder.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, OrgId, Role, UserId},
};

/// Errors produced by [`PrincipalBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum PrincipalBuilderError {
	/// Issued when no username was provided.
	#[error("Username is required.")]
	MissingUsername,
	/// Issued when no email was provided.
	#[error("Email is required.")]
	MissingEmail,
	/// Issued when no bearer token was provided.
	#[error("Bearer token is required.")]
	MissingToken,
}

/// Authenticated identity held by the session for the lifetime of a login.
///
/// A principal exists iff authentication succeeded and has not been cleared.
/// Persists as a flat JSON object with no versioning.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	/// User identifier assigned by the auth service.
	pub id: UserId,
	/// Login name.
	pub username: String,
	/// Display name composed from the wire first/last name pair.
	pub name: String,
	/// Contact email.
	pub email: String,
	/// Role assigned at login; immutable for the session lifetime.
	pub role: Role,
	/// Organization (law firm, agency) the user belongs to, when any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization: Option<OrgId>,
	/// Opaque bearer token; callers must avoid logging it.
	pub token: BearerToken,
}
impl Principal {
	/// Returns a builder seeded with the required identifier and role.
	pub fn builder(id: UserId, role: Role) -> PrincipalBuilder {
		PrincipalBuilder::new(id, role)
	}

	/// Returns true if the principal carries token material.
	///
	/// Presence only; the token is never validated client-side.
	pub fn has_token(&self) -> bool {
		!self.token.is_empty()
	}
}
impl Debug for Principal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Principal")
			.field("id", &self.id)
			.field("username", &self.username)
			.field("name", &self.name)
			.field("email", &self.email)
			.field("role", &self.role)
			.field("organization", &self.organization)
			.field("token", &"<redacted>")
			.finish()
	}
}

/// Builder for [`Principal`].
#[derive(Clone, Debug)]
pub struct PrincipalBuilder {
	id: UserId,
	role: Role,
	username: Option<String>,
	name: Option<String>,
	email: Option<String>,
	organization: Option<OrgId>,
	token: Option<BearerToken>,
}
impl PrincipalBuilder {
	fn new(id: UserId, role: Role) -> Self {
		Self { id, role, username: None, name: None, email: None, organization: None, token: None }
	}

	/// Sets the login name.
	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Sets the display name. Defaults to the username when omitted.
	pub fn display_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the contact email.
	pub fn email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}

	/// Sets the organization reference.
	pub fn organization(mut self, organization: OrgId) -> Self {
		self.organization = Some(organization);

		self
	}

	/// Provides the bearer token value.
	pub fn token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(BearerToken::new(token));

		self
	}

	/// Consumes the builder and produces a [`Principal`].
	pub fn build(self) -> Result<Principal, PrincipalBuilderError> {
		let username = self.username.ok_or(PrincipalBuilderError::MissingUsername)?;
		let email = self.email.ok_or(PrincipalBuilderError::MissingEmail)?;
		let token = self.token.ok_or(PrincipalBuilderError::MissingToken)?;
		let name = self.name.unwrap_or_else(|| username.clone());

		Ok(Principal {
			id: self.id,
			username,
			name,
			email,
			role: self.role,
			organization: self.organization,
			token,
		})
	}
}
