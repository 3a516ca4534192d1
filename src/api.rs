//! Auth API endpoint descriptor and builder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default login route, matching the portals' auth controller.
pub const DEFAULT_LOGIN_PATH: &str = "/api/auth/login";
/// Default registration route, matching the portals' users controller.
pub const DEFAULT_REGISTER_PATH: &str = "/api/users";

/// Validated endpoint set for the external auth service.
///
/// The descriptor is immutable once built; the session service resolves every
/// outbound call against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthApi {
	/// Base URL the route paths were joined onto.
	pub base: Url,
	/// Resolved login endpoint.
	pub login: Url,
	/// Resolved registration endpoint.
	pub register: Url,
}
impl AuthApi {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base: Url) -> AuthApiBuilder {
		AuthApiBuilder::new(base)
	}

	/// Parses a base URL string and builds a descriptor with the default routes.
	pub fn parse(base: impl AsRef<str>) -> Result<Self, ConfigError> {
		let base = Url::parse(base.as_ref())
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Self::builder(base).build()
	}

	/// Resolved login endpoint.
	pub fn login_url(&self) -> &Url {
		&self.login
	}

	/// Resolved registration endpoint.
	pub fn register_url(&self) -> &Url {
		&self.register
	}
}

/// Builder for [`AuthApi`] values.
#[derive(Clone, Debug)]
pub struct AuthApiBuilder {
	/// Base URL the route paths will be joined onto.
	pub base: Url,
	/// Login route path; defaults to [`DEFAULT_LOGIN_PATH`].
	pub login_path: String,
	/// Registration route path; defaults to [`DEFAULT_REGISTER_PATH`].
	pub register_path: String,
}
impl AuthApiBuilder {
	/// Creates a new builder seeded with the provided base URL and default routes.
	pub fn new(base: Url) -> Self {
		Self {
			base,
			login_path: DEFAULT_LOGIN_PATH.into(),
			register_path: DEFAULT_REGISTER_PATH.into(),
		}
	}

	/// Overrides the login route path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the registration route path.
	pub fn register_path(mut self, path: impl Into<String>) -> Self {
		self.register_path = path.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<AuthApi, ConfigError> {
		validate_base(&self.base)?;

		let login = join_route(&self.base, &self.login_path)?;
		let register = join_route(&self.base, &self.register_path)?;

		Ok(AuthApi { base: self.base, login, register })
	}
}

fn validate_base(base: &Url) -> Result<(), ConfigError> {
	if !matches!(base.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { url: base.to_string() });
	}

	Ok(())
}

fn join_route(base: &Url, path: &str) -> Result<Url, ConfigError> {
	if !path.starts_with('/') {
		return Err(ConfigError::InvalidRoutePath { path: path.to_owned() });
	}

	base.join(path).map_err(|_| ConfigError::InvalidRoutePath { path: path.to_owned() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_resolve_against_the_origin() {
		let api = AuthApi::parse("https://portal.example.com")
			.expect("Descriptor with default routes should build.");

		assert_eq!(api.login_url().as_str(), "https://portal.example.com/api/auth/login");
		assert_eq!(api.register_url().as_str(), "https://portal.example.com/api/users");
	}

	#[test]
	fn custom_paths_replace_the_base_path() {
		let base = Url::parse("http://localhost:5267/ignored").expect("Base URL should parse.");
		let api = AuthApi::builder(base)
			.login_path("/auth/session")
			.register_path("/auth/users")
			.build()
			.expect("Descriptor with custom routes should build.");

		assert_eq!(api.login_url().as_str(), "http://localhost:5267/auth/session");
		assert_eq!(api.register_url().as_str(), "http://localhost:5267/auth/users");
	}

	#[test]
	fn descriptor_round_trips_through_serde() {
		let api =
			AuthApi::parse("https://portal.example.com").expect("Descriptor fixture should build.");
		let payload = serde_json::to_string(&api).expect("Descriptor should serialize.");
		let round_trip: AuthApi =
			serde_json::from_str(&payload).expect("Descriptor should deserialize.");

		assert_eq!(round_trip, api);
	}

	#[test]
	fn non_http_schemes_are_rejected() {
		let base = Url::parse("ftp://portal.example.com").expect("Base URL should parse.");

		assert!(matches!(
			AuthApi::builder(base).build(),
			Err(ConfigError::UnsupportedScheme { .. })
		));
	}

	#[test]
	fn relative_route_paths_are_rejected() {
		let base = Url::parse("https://portal.example.com").expect("Base URL should parse.");

		assert!(matches!(
			AuthApi::builder(base).login_path("api/auth/login").build(),
			Err(ConfigError::InvalidRoutePath { .. })
		));
	}
}
