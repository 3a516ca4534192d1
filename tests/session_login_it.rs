// std
use std::{
	env,
	path::PathBuf,
	process,
	time::{Duration, SystemTime, UNIX_EPOCH},
};
// crates.io
use httpmock::prelude::*;
// self
use session_guard::{
	_preludet::*,
	api::AuthApi,
	auth::Role,
	error::{AuthApiError, Error},
	http::{ApiFuture, AuthResponse, Credentials, CredentialsClient, RegistrationRequest},
	session::SessionService,
	store::{FileStore, PrincipalStore},
};

const LOGIN_BODY: &str = "{\"userId\":17,\"username\":\"jdoe\",\"firstName\":\"John\",\
	 \"lastName\":\"Doe\",\"email\":\"jdoe@example.com\",\"role\":\"Lawyer\",\"lawFirmId\":3,\
	 \"token\":\"issued-jwt\"}";

fn build_api(server: &MockServer) -> AuthApi {
	AuthApi::parse(server.base_url()).expect("Mock auth API descriptor should build.")
}

fn temp_store_path() -> PathBuf {
	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should be past the epoch.")
		.as_nanos();
	let unique = format!("session_guard_login_it_{}_{nanos}.json", process::id());

	env::temp_dir().join(unique)
}

#[tokio::test]
async fn login_persists_the_mapped_principal() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).header("content-type", "application/json").body(LOGIN_BODY);
		})
		.await;
	let path = temp_store_path();
	let store_backend =
		Arc::new(FileStore::open(&path).expect("File store slot should open."));
	let store: Arc<dyn PrincipalStore> = store_backend.clone();
	let service =
		SessionService::with_client(store, build_api(&server), test_reqwest_credentials_client());
	let principal =
		service.login("jdoe", "hunter2").await.expect("Mocked login should succeed.");

	mock.assert_async().await;

	assert!(service.is_authenticated());
	assert_eq!(principal.id.as_ref(), "17");
	assert_eq!(principal.username, "jdoe");
	assert_eq!(principal.name, "John Doe");
	assert_eq!(principal.email, "jdoe@example.com");
	assert_eq!(principal.role, Role::Lawyer);
	assert_eq!(principal.organization.as_ref().map(AsRef::as_ref), Some("3"));
	assert_eq!(principal.token.expose(), "issued-jwt");

	// The slot must survive a reload through a fresh store instance.
	let reopened = FileStore::open(&path).expect("File store slot should reopen.");
	let persisted = reopened
		.load()
		.await
		.expect("Reopened slot should load.")
		.expect("Login should have persisted the principal.");

	assert_eq!(persisted, principal);

	std::fs::remove_file(&path).expect("Temporary slot file should be removable.");
}

#[tokio::test]
async fn hydrate_then_logout_round_trip() {
	let server = MockServer::start_async().await;
	let path = temp_store_path();

	{
		let store_backend =
			Arc::new(FileStore::open(&path).expect("File store slot should open."));

		store_backend
			.save(sample_principal(Role::Secretary, "stored-jwt"))
			.await
			.expect("Seeding the slot should succeed.");
	}

	let store: Arc<dyn PrincipalStore> =
		Arc::new(FileStore::open(&path).expect("File store slot should reopen."));
	let service =
		SessionService::with_client(store, build_api(&server), test_reqwest_credentials_client());

	service.hydrate().await;

	assert!(service.is_authenticated());
	assert_eq!(service.authorization_header().as_deref(), Some("Bearer stored-jwt"));
	assert!(service.has_role(Role::Secretary));

	service.logout().await;

	assert!(!service.is_authenticated());
	assert!(!path.exists(), "Logout should delete the persisted slot.");
}

#[tokio::test]
async fn rejected_login_surfaces_the_server_message() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Invalid username or password\"}");
		})
		.await;
	let (service, store) = build_reqwest_test_session(build_api(&server));
	let err = service
		.login("user1", "wrongpass")
		.await
		.expect_err("Rejected credentials should propagate.");

	mock.assert_async().await;

	assert!(matches!(
		err,
		Error::Api(AuthApiError::Rejected { ref message, .. }) if message == "Invalid username or password"
	));
	assert_eq!(service.last_error().as_deref(), Some("Invalid username or password"));
	assert!(!service.is_authenticated());
	assert!(store.load().await.expect("Store load should succeed.").is_none());
}

#[tokio::test]
async fn register_establishes_the_session() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/users");
			then.status(200).header("content-type", "application/json").body(LOGIN_BODY);
		})
		.await;
	let (service, store) = build_reqwest_test_session(build_api(&server));
	let request = RegistrationRequest {
		username: "jdoe".into(),
		password: "hunter2".into(),
		first_name: "John".into(),
		last_name: "Doe".into(),
		email: "jdoe@example.com".into(),
		role: "Lawyer".into(),
		organization_id: Some("3".into()),
	};
	let principal =
		service.register(request).await.expect("Mocked registration should succeed.");

	mock.assert_async().await;

	assert!(service.is_authenticated());
	assert_eq!(
		store
			.load()
			.await
			.expect("Store load should succeed.")
			.expect("Registration should persist the principal."),
		principal,
	);
}

/// Transport that answers each login after a scripted delay, so overlapping
/// attempts can be forced to settle in either order.
struct DelayedClient {
	outcomes: std::sync::Mutex<Vec<(Duration, AuthResponse)>>,
}
impl DelayedClient {
	fn new(outcomes: Vec<(Duration, AuthResponse)>) -> Self {
		Self { outcomes: std::sync::Mutex::new(outcomes) }
	}
}
impl CredentialsClient for DelayedClient {
	fn login<'a>(
		&'a self,
		_endpoint: &'a Url,
		_credentials: &'a Credentials,
	) -> ApiFuture<'a, AuthResponse> {
		let (delay, response) = {
			let mut outcomes =
				self.outcomes.lock().expect("Delayed login script lock should not be poisoned.");

			outcomes.remove(0)
		};

		Box::pin(async move {
			tokio::time::sleep(delay).await;

			Ok(response)
		})
	}

	fn register<'a>(
		&'a self,
		_endpoint: &'a Url,
		_request: &'a RegistrationRequest,
	) -> ApiFuture<'a, AuthResponse> {
		unimplemented!("This fixture only scripts logins.")
	}
}

fn delayed_session(
	outcomes: Vec<(Duration, AuthResponse)>,
) -> (SessionService<DelayedClient>, Arc<dyn PrincipalStore>) {
	let store: Arc<dyn PrincipalStore> =
		Arc::new(session_guard::store::MemoryStore::default());
	let api = AuthApi::parse("https://session-guard.test")
		.expect("Test auth API descriptor should build.");
	let service =
		SessionService::with_client(store.clone(), api, DelayedClient::new(outcomes));

	(service, store)
}

#[tokio::test]
async fn superseded_login_is_discarded_when_it_settles_last() {
	// First attempt resolves slowly, second quickly; the second (newer) wins.
	let (service, store) = delayed_session(vec![
		(Duration::from_millis(200), sample_auth_response("Lawyer", "stale-jwt")),
		(Duration::from_millis(10), sample_auth_response("Admin", "fresh-jwt")),
	]);
	let (first, second) =
		tokio::join!(service.login("jdoe", "old"), service.login("jdoe", "new"));

	assert!(matches!(first, Err(Error::Superseded { .. })));

	let winner = second.expect("The newer attempt should win.");

	assert_eq!(winner.token.expose(), "fresh-jwt");
	assert_eq!(service.authorization_header().as_deref(), Some("Bearer fresh-jwt"));
	assert!(service.has_role(Role::Admin));

	let persisted = store
		.load()
		.await
		.expect("Store load should succeed.")
		.expect("Winning attempt should persist.");

	assert_eq!(persisted.token.expose(), "fresh-jwt");
}

#[tokio::test]
async fn superseded_login_is_discarded_even_when_it_settles_first() {
	// First attempt resolves quickly but was already superseded at issue time.
	let (service, store) = delayed_session(vec![
		(Duration::from_millis(10), sample_auth_response("Lawyer", "stale-jwt")),
		(Duration::from_millis(200), sample_auth_response("Admin", "fresh-jwt")),
	]);
	let (first, second) =
		tokio::join!(service.login("jdoe", "old"), service.login("jdoe", "new"));

	assert!(matches!(first, Err(Error::Superseded { .. })));

	let winner = second.expect("The newer attempt should win.");

	assert_eq!(winner.token.expose(), "fresh-jwt");

	let persisted = store
		.load()
		.await
		.expect("Store load should succeed.")
		.expect("Winning attempt should persist.");

	assert_eq!(persisted.token.expose(), "fresh-jwt");
}
