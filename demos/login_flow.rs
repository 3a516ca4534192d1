//! Demonstrates the full session lifecycle against a mocked auth service: login,
//! header sourcing for downstream REST calls, and logout.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use session_guard::{
	api::AuthApi,
	auth::Role,
	session::SessionService,
	store::{MemoryStore, PrincipalStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).header("content-type", "application/json").body(
				"{\"userId\":17,\"username\":\"jdoe\",\"firstName\":\"John\",\"lastName\":\"Doe\",\
				 \"email\":\"jdoe@example.com\",\"role\":\"Lawyer\",\"lawFirmId\":3,\
				 \"token\":\"demo-jwt\"}",
			);
		})
		.await;
	let api = AuthApi::parse(server.base_url())?;
	let store: Arc<dyn PrincipalStore> = Arc::new(MemoryStore::default());
	let session = SessionService::new(store, api);

	session.hydrate().await;

	println!("after hydrate, authenticated: {}", session.is_authenticated());

	let principal = session.login("jdoe", "hunter2").await?;

	login_mock.assert_async().await;
	println!("logged in as {} ({})", principal.name, principal.role);
	println!("lawyer or admin: {}", session.has_role([Role::Lawyer, Role::Admin]));
	println!(
		"authorization header: {}",
		session.authorization_header().unwrap_or_else(|| "<none>".into())
	);

	session.logout().await;

	println!("after logout, authenticated: {}", session.is_authenticated());

	Ok(())
}
