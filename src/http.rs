//! Transport primitives for credential exchanges with the external auth service.
//!
//! The module exposes [`CredentialsClient`] as the crate's only dependency on an
//! HTTP stack, alongside the wire DTOs shared by every implementation. A
//! reqwest-backed client ships behind the default `reqwest` feature; tests swap
//! in scripted implementations of the same trait.

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	auth::{OrgId, Principal, UserId},
	error::{AuthApiError, ConfigError},
};

/// Fallback message recorded when a login rejection carries no usable error body.
pub const LOGIN_REJECTED_FALLBACK: &str = "Login failed";
/// Fallback message recorded when a registration rejection carries no usable error body.
pub const REGISTER_REJECTED_FALLBACK: &str = "Registration failed";

/// Boxed future returned by [`CredentialsClient`] implementations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuthApiError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing credential exchanges.
///
/// Implementations must be `Send + Sync` so a single client can be shared by
/// cloned session services. Both operations are plain JSON POSTs; neither
/// follows redirects nor retries internally.
pub trait CredentialsClient
where
	Self: Send + Sync,
{
	/// POSTs the credentials to the login endpoint.
	fn login<'a>(
		&'a self,
		endpoint: &'a Url,
		credentials: &'a Credentials,
	) -> ApiFuture<'a, AuthResponse>;

	/// POSTs the registration payload to the users endpoint.
	fn register<'a>(
		&'a self,
		endpoint: &'a Url,
		request: &'a RegistrationRequest,
	) -> ApiFuture<'a, AuthResponse>;
}

/// Login request body.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
	/// Login name.
	pub username: String,
	/// Plain-text password forwarded to the auth service.
	pub password: String,
}

/// Registration request body.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
	/// Desired login name.
	pub username: String,
	/// Plain-text password forwarded to the auth service.
	pub password: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Contact email.
	pub email: String,
	/// Requested role label.
	pub role: String,
	/// Organization the account belongs to, when already known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub organization_id: Option<String>,
}

/// Identifier value as it appears on the wire; servers emit both numbers and strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
	/// String identifier, used verbatim.
	Text(String),
	/// Numeric identifier, canonicalized to its decimal form.
	Number(u64),
}
impl Display for WireId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			WireId::Text(value) => f.write_str(value),
			WireId::Number(value) => write!(f, "{value}"),
		}
	}
}

/// Successful auth response as emitted by the external service.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
	/// User identifier.
	pub user_id: WireId,
	/// Login name.
	pub username: String,
	/// Given name; composed with the family name into the display name.
	#[serde(default)]
	pub first_name: String,
	/// Family name.
	#[serde(default)]
	pub last_name: String,
	/// Contact email.
	pub email: String,
	/// Role label; must belong to the closed role set.
	pub role: String,
	/// Law-firm association, when the legal portal issued the response.
	#[serde(default)]
	pub law_firm_id: Option<WireId>,
	/// Agency association, when the rental portal issued the response.
	#[serde(default)]
	pub agency_id: Option<WireId>,
	/// Opaque bearer token.
	pub token: String,
}
impl AuthResponse {
	/// Maps the wire response onto a [`Principal`], validating identifiers and the role.
	pub fn into_principal(self) -> Result<Principal, ConfigError> {
		let id = match self.user_id {
			WireId::Text(value) => UserId::new(value)?,
			WireId::Number(value) => UserId::from_numeric(value),
		};
		let role = self.role.parse()?;
		let organization = match self.law_firm_id.or(self.agency_id) {
			Some(WireId::Text(value)) => Some(OrgId::new(value)?),
			Some(WireId::Number(value)) => Some(OrgId::from_numeric(value)),
			None => None,
		};
		let mut builder = Principal::builder(id, role)
			.username(self.username)
			.display_name(format!("{} {}", self.first_name, self.last_name))
			.email(self.email)
			.token(self.token);

		if let Some(organization) = organization {
			builder = builder.organization(organization);
		}

		Ok(builder.build()?)
	}
}
impl Debug for AuthResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthResponse")
			.field("user_id", &self.user_id)
			.field("username", &self.username)
			.field("role", &self.role)
			.field("token", &"<redacted>")
			.finish()
	}
}

/// Error payload emitted by the auth service on non-2xx responses.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
	/// Human-readable message, when the service supplied one.
	#[serde(default)]
	pub message: Option<String>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Auth posts return results directly; configure any custom [`ReqwestClient`] to
/// disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestCredentialsClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestCredentialsClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn post_json<B>(
		&self,
		endpoint: &Url,
		body: &B,
		rejection_fallback: &'static str,
	) -> Result<AuthResponse, AuthApiError>
	where
		B: Serialize + Sync,
	{
		let response = self.0.post(endpoint.clone()).json(body).send().await?;
		let status = response.status();
		let bytes = response.bytes().await?;

		if !status.is_success() {
			let message = serde_json::from_slice::<ErrorBody>(&bytes)
				.ok()
				.and_then(|body| body.message)
				.unwrap_or_else(|| rejection_fallback.to_owned());

			return Err(AuthApiError::Rejected { message, status: Some(status.as_u16()) });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| AuthApiError::Parse { source, status: Some(status.as_u16()) })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestCredentialsClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestCredentialsClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl CredentialsClient for ReqwestCredentialsClient {
	fn login<'a>(
		&'a self,
		endpoint: &'a Url,
		credentials: &'a Credentials,
	) -> ApiFuture<'a, AuthResponse> {
		Box::pin(self.post_json(endpoint, credentials, LOGIN_REJECTED_FALLBACK))
	}

	fn register<'a>(
		&'a self,
		endpoint: &'a Url,
		request: &'a RegistrationRequest,
	) -> ApiFuture<'a, AuthResponse> {
		Box::pin(self.post_json(endpoint, request, REGISTER_REJECTED_FALLBACK))
	}
}
