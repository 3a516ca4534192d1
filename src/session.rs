//! Session service owning the authenticated principal and its lifecycle.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	api::AuthApi,
	auth::{Principal, Role, RoleSet},
	error::AuthApiError,
	http::{Credentials, CredentialsClient, RegistrationRequest},
	obs::{self, OpOutcome, OpSpan, SessionOp},
	store::PrincipalStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestCredentialsClient;

#[cfg(feature = "reqwest")]
/// Session service specialized for the crate's default reqwest transport.
pub type ReqwestSessionService = SessionService<ReqwestCredentialsClient>;

/// Point-in-time copy of the session state consumed by guards and views.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
	/// True while hydrate or a credential exchange is in flight.
	pub loading: bool,
	/// Current session subject, when one exists.
	pub principal: Option<Principal>,
	/// Most recent human-readable operation error, for inline display.
	pub last_error: Option<String>,
}
impl SessionSnapshot {
	/// True iff a subject exists and its token is non-empty.
	///
	/// Presence check only, never a validity or expiry check.
	pub fn is_authenticated(&self) -> bool {
		self.principal.as_ref().is_some_and(Principal::has_token)
	}

	/// Role of the current subject, when one exists.
	pub fn role(&self) -> Option<Role> {
		self.principal.as_ref().map(|principal| principal.role)
	}
}

#[derive(Debug, Default)]
struct SessionState {
	loading: bool,
	principal: Option<Principal>,
	last_error: Option<String>,
}

/// Single source of truth for "who is logged in".
///
/// The service owns the auth API descriptor, the transport, and the principal
/// store; all session mutation goes through its own operations and every other
/// component only reads from it. Cloning shares the same underlying state.
///
/// Concurrent logins are not serialized: each attempt takes a ticket from a
/// monotonic counter and an attempt that settles after a newer ticket was
/// issued discards its outcome, so the last caller wins deterministically.
pub struct SessionService<C>
where
	C: ?Sized + CredentialsClient,
{
	api: AuthApi,
	client: Arc<C>,
	store: Arc<dyn PrincipalStore>,
	state: Arc<RwLock<SessionState>>,
	ticket: Arc<AtomicU64>,
}
impl<C> SessionService<C>
where
	C: ?Sized + CredentialsClient,
{
	/// Creates a session service that reuses the caller-provided transport.
	pub fn with_client(
		store: Arc<dyn PrincipalStore>,
		api: AuthApi,
		client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			api,
			client: client.into(),
			store,
			state: Arc::new(RwLock::new(SessionState::default())),
			ticket: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Restores a previously persisted principal from durable storage.
	///
	/// Never fails: an absent, unreadable, or corrupt slot is treated as
	/// logged-out. No network call is made. The loading flag is true for the
	/// duration and false afterwards regardless of outcome.
	///
	/// Takes a ticket from the same supersession counter as the credential
	/// operations, so a hydrate overlapping a newer login or registration
	/// discards the restored slot instead of clobbering the fresh session.
	pub async fn hydrate(&self) {
		const OP: SessionOp = SessionOp::Hydrate;

		let span = OpSpan::new(OP, "hydrate");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let ticket = self.issue_ticket();

		self.begin_op();

		let result = span.instrument(self.store.load()).await;
		let restored = match result {
			Ok(slot) => {
				obs::record_op_outcome(OP, OpOutcome::Success);

				slot
			},
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_e, "Hydrate failed to read the principal slot.");

				obs::record_op_outcome(OP, OpOutcome::Failure);

				None
			},
		};

		if !self.is_current(ticket) {
			self.note_superseded(OP, ticket);

			return;
		}

		let mut state = self.state.write();

		state.principal = restored;
		state.loading = false;
	}

	/// Delegates credential verification to the auth service and, on success,
	/// sets the mapped principal as current and persists it.
	///
	/// On failure the subject stays unset, the human-readable message is
	/// recorded for inline display, and the typed error propagates to the
	/// caller. No retry is attempted and no timeout is enforced beyond the
	/// transport's own behavior.
	pub async fn login(
		&self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<Principal> {
		const OP: SessionOp = SessionOp::Login;

		let span = OpSpan::new(OP, "login");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let ticket = self.issue_ticket();

		self.begin_op();

		let credentials =
			Credentials { username: username.into(), password: password.into() };
		let outcome = span
			.instrument(async {
				let response = self.client.login(self.api.login_url(), &credentials).await?;

				Ok(response.into_principal()?)
			})
			.await;

		self.settle(OP, ticket, outcome).await
	}

	/// Creates an account through the auth service and, on success, establishes
	/// the session exactly like [`login`](Self::login).
	///
	/// Shares the supersession counter with login, so a registration racing a
	/// login is still last-caller-wins.
	pub async fn register(&self, request: RegistrationRequest) -> Result<Principal> {
		const OP: SessionOp = SessionOp::Register;

		let span = OpSpan::new(OP, "register");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let ticket = self.issue_ticket();

		self.begin_op();

		let outcome = span
			.instrument(async {
				let response = self.client.register(self.api.register_url(), &request).await?;

				Ok(response.into_principal()?)
			})
			.await;

		self.settle(OP, ticket, outcome).await
	}

	/// Clears the current subject and removes it from durable storage.
	///
	/// Idempotent; a failing storage clear is swallowed and the in-memory
	/// session is cleared regardless.
	pub async fn logout(&self) {
		const OP: SessionOp = SessionOp::Logout;

		let span = OpSpan::new(OP, "logout");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span.instrument(self.store.clear()).await;

		match result {
			Ok(()) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_e, "Logout failed to clear the principal slot.");

				obs::record_op_outcome(OP, OpOutcome::Failure);
			},
		}

		let mut state = self.state.write();

		state.principal = None;
		state.last_error = None;
	}

	/// True iff a subject exists and its role is contained in the supplied
	/// one-or-set. False when logged out.
	pub fn has_role(&self, required: impl Into<RoleSet>) -> bool {
		let required = required.into();

		self.state
			.read()
			.principal
			.as_ref()
			.is_some_and(|principal| required.contains(principal.role))
	}

	/// True iff a subject exists and its token is non-empty.
	///
	/// Presence check only, never a validity or expiry check.
	pub fn is_authenticated(&self) -> bool {
		self.state.read().principal.as_ref().is_some_and(Principal::has_token)
	}

	/// `Authorization` header value for downstream REST calls, when logged in.
	///
	/// This is the single sourcing point for the bearer token.
	pub fn authorization_header(&self) -> Option<String> {
		let state = self.state.read();
		let principal = state.principal.as_ref().filter(|principal| principal.has_token())?;

		Some(format!("Bearer {}", principal.token.expose()))
	}

	/// Current session subject, when one exists.
	pub fn current_principal(&self) -> Option<Principal> {
		self.state.read().principal.clone()
	}

	/// Most recent operation error message, for inline display.
	pub fn last_error(&self) -> Option<String> {
		self.state.read().last_error.clone()
	}

	/// Clears the recorded error message.
	pub fn clear_error(&self) {
		self.state.write().last_error = None;
	}

	/// True while hydrate or a credential exchange is in flight.
	pub fn loading(&self) -> bool {
		self.state.read().loading
	}

	/// Cheap copy of the current state for guards and views.
	pub fn snapshot(&self) -> SessionSnapshot {
		let state = self.state.read();

		SessionSnapshot {
			loading: state.loading,
			principal: state.principal.clone(),
			last_error: state.last_error.clone(),
		}
	}

	fn begin_op(&self) {
		let mut state = self.state.write();

		state.loading = true;
		state.last_error = None;
	}

	fn issue_ticket(&self) -> u64 {
		self.ticket.fetch_add(1, Ordering::SeqCst) + 1
	}

	fn is_current(&self, ticket: u64) -> bool {
		self.ticket.load(Ordering::SeqCst) == ticket
	}

	fn note_superseded(&self, op: SessionOp, ticket: u64) {
		#[cfg(feature = "tracing")]
		tracing::debug!(op = op.as_str(), ticket, "Discarding superseded outcome.");
		#[cfg(not(feature = "tracing"))]
		let _ = ticket;

		obs::record_op_outcome(op, OpOutcome::Superseded);
	}

	/// Puts storage back in line with the in-memory session after a stale
	/// attempt's save landed. A failing undo is swallowed; storage converges on
	/// the next successful operation.
	async fn undo_stale_persist(&self) {
		let current = self.state.read().principal.clone();
		let result = match current {
			Some(principal) => self.store.save(principal).await,
			None => self.store.clear().await,
		};

		match result {
			Ok(()) => (),
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_e, "Failed to undo a superseded persist.");
			},
		}
	}

	async fn settle(
		&self,
		op: SessionOp,
		ticket: u64,
		outcome: Result<Principal>,
	) -> Result<Principal> {
		if !self.is_current(ticket) {
			self.note_superseded(op, ticket);

			return Err(Error::Superseded { ticket });
		}

		match outcome {
			Ok(principal) => {
				if let Err(e) = self.store.save(principal.clone()).await {
					if !self.is_current(ticket) {
						self.note_superseded(op, ticket);

						return Err(Error::Superseded { ticket });
					}

					let mut state = self.state.write();

					state.loading = false;
					state.last_error = Some(e.to_string());

					obs::record_op_outcome(op, OpOutcome::Failure);

					return Err(e.into());
				}
				if !self.is_current(ticket) {
					// The save landed after a newer attempt took over; back it out.
					self.undo_stale_persist().await;
					self.note_superseded(op, ticket);

					return Err(Error::Superseded { ticket });
				}

				let mut state = self.state.write();

				state.loading = false;
				state.principal = Some(principal.clone());
				state.last_error = None;

				obs::record_op_outcome(op, OpOutcome::Success);

				Ok(principal)
			},
			Err(e) => {
				let mut state = self.state.write();

				state.loading = false;
				state.last_error = Some(surface_message(&e));

				obs::record_op_outcome(op, OpOutcome::Failure);

				Err(e)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl SessionService<ReqwestCredentialsClient> {
	/// Creates a session service with the crate's default reqwest transport.
	pub fn new(store: Arc<dyn PrincipalStore>, api: AuthApi) -> Self {
		Self::with_client(store, api, ReqwestCredentialsClient::default())
	}
}
impl<C> Clone for SessionService<C>
where
	C: ?Sized + CredentialsClient,
{
	fn clone(&self) -> Self {
		Self {
			api: self.api.clone(),
			client: Arc::clone(&self.client),
			store: Arc::clone(&self.store),
			state: Arc::clone(&self.state),
			ticket: Arc::clone(&self.ticket),
		}
	}
}
impl<C> Debug for SessionService<C>
where
	C: ?Sized + CredentialsClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionService")
			.field("api", &self.api)
			.field("authenticated", &self.is_authenticated())
			.field("loading", &self.loading())
			.finish()
	}
}

fn surface_message(e: &Error) -> String {
	match e {
		Error::Api(AuthApiError::Rejected { message, .. }) => message.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		store::{MemoryStore, StoreError, StoreFuture},
	};

	/// Backend whose save/load futures resolve after a scripted delay, so a
	/// competing operation can be forced to overlap the persistence step.
	struct LaggyStore {
		inner: MemoryStore,
		save_delay: Duration,
		load_delay: Duration,
	}
	impl LaggyStore {
		fn new(save_delay: Duration, load_delay: Duration) -> Self {
			Self { inner: MemoryStore::default(), save_delay, load_delay }
		}
	}
	impl PrincipalStore for LaggyStore {
		fn save(&self, principal: Principal) -> StoreFuture<'_, ()> {
			Box::pin(async move {
				tokio::time::sleep(self.save_delay).await;

				self.inner.save(principal).await
			})
		}

		fn load(&self) -> StoreFuture<'_, Option<Principal>> {
			Box::pin(async move {
				tokio::time::sleep(self.load_delay).await;

				self.inner.load().await
			})
		}

		fn clear(&self) -> StoreFuture<'_, ()> {
			Box::pin(async move { self.inner.clear().await })
		}
	}

	struct FailingStore;
	impl PrincipalStore for FailingStore {
		fn save(&self, _principal: Principal) -> StoreFuture<'_, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "save refused".into() }) })
		}

		fn load(&self) -> StoreFuture<'_, Option<Principal>> {
			Box::pin(async { Err(StoreError::Backend { message: "load refused".into() }) })
		}

		fn clear(&self) -> StoreFuture<'_, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "clear refused".into() }) })
		}
	}

	#[tokio::test]
	async fn login_success_sets_session_and_persists() {
		let (service, store, client) = test_session_service();

		client.push_login(Ok(sample_auth_response("Lawyer", "jwt-material")));

		let principal =
			service.login("jdoe", "hunter2").await.expect("Scripted login should succeed.");

		assert_eq!(principal.name, "John Doe");
		assert!(service.is_authenticated());
		assert!(!service.loading());
		assert_eq!(service.last_error(), None);
		assert_eq!(
			service.authorization_header().as_deref(),
			Some("Bearer jwt-material")
		);

		let persisted = store
			.load()
			.await
			.expect("Memory store load should succeed.")
			.expect("Login should persist the principal.");

		assert_eq!(persisted, principal);
	}

	#[tokio::test]
	async fn login_rejection_records_the_server_message() {
		let (service, store, client) = test_session_service();

		client.push_login(Err(AuthApiError::Rejected {
			message: "Invalid username or password".into(),
			status: Some(401),
		}));

		let err = service
			.login("user1", "wrongpass")
			.await
			.expect_err("Rejected login should propagate to the caller.");

		assert!(matches!(err, crate::error::Error::Api(AuthApiError::Rejected { .. })));
		assert_eq!(service.last_error().as_deref(), Some("Invalid username or password"));
		assert!(!service.is_authenticated());
		assert!(store.load().await.expect("Memory store load should succeed.").is_none());
	}

	#[tokio::test]
	async fn login_failure_on_persist_surfaces_storage_error() {
		let client = Arc::new(MockCredentialsClient::default());

		client.push_login(Ok(sample_auth_response("Admin", "jwt")));

		let api = crate::api::AuthApi::parse("https://session-guard.test")
			.expect("Test auth API descriptor should build.");
		let service = SessionService::<MockCredentialsClient>::with_client(
			Arc::new(FailingStore) as Arc<dyn PrincipalStore>,
			api,
			client,
		);
		let err = service
			.login("jdoe", "hunter2")
			.await
			.expect_err("A failing save should surface during login.");

		assert!(matches!(err, crate::error::Error::Storage(_)));
		assert!(!service.is_authenticated());
	}

	#[tokio::test]
	async fn hydrate_restores_without_a_network_call() {
		let (service, store, client) = test_session_service();
		let principal = sample_principal(Role::Secretary, "persisted-jwt");

		store.save(principal.clone()).await.expect("Seeding the slot should succeed.");
		service.hydrate().await;

		assert_eq!(service.current_principal(), Some(principal));
		assert!(service.is_authenticated());
		assert!(!service.loading());
		assert_eq!(client.calls(), 0, "Hydrate must not touch the network.");
	}

	#[tokio::test]
	async fn hydrate_swallows_storage_failures() {
		let client = Arc::new(MockCredentialsClient::default());
		let api = crate::api::AuthApi::parse("https://session-guard.test")
			.expect("Test auth API descriptor should build.");
		let service = SessionService::<MockCredentialsClient>::with_client(
			Arc::new(FailingStore) as Arc<dyn PrincipalStore>,
			api,
			client,
		);

		service.hydrate().await;

		assert!(!service.is_authenticated());
		assert!(!service.loading());
		assert_eq!(service.last_error(), None);
	}

	#[tokio::test]
	async fn logout_is_idempotent_even_without_a_session() {
		let (service, store, client) = test_session_service();

		service.logout().await;

		assert!(!service.is_authenticated());

		client.push_login(Ok(sample_auth_response("Manager", "jwt")));
		service.login("jdoe", "hunter2").await.expect("Scripted login should succeed.");
		service.logout().await;
		service.logout().await;

		assert!(!service.is_authenticated());
		assert_eq!(service.authorization_header(), None);
		assert!(store.load().await.expect("Memory store load should succeed.").is_none());
	}

	#[tokio::test]
	async fn has_role_matches_set_membership() {
		let (service, _store, client) = test_session_service();

		assert!(!service.has_role(Role::Admin), "No session means no role.");

		client.push_login(Ok(sample_auth_response("Secretary", "jwt")));
		service.login("jdoe", "hunter2").await.expect("Scripted login should succeed.");

		assert!(service.has_role(Role::Secretary));
		assert!(service.has_role([Role::Admin, Role::Secretary]));
		assert!(!service.has_role(Role::Admin));
		assert!(!service.has_role([Role::Admin, Role::Lawyer]));
		assert!(!service.has_role(RoleSet::default()));
	}

	#[tokio::test]
	async fn empty_token_is_not_authenticated() {
		let (service, store, _client) = test_session_service();

		store
			.save(sample_principal(Role::Client, ""))
			.await
			.expect("Seeding the slot should succeed.");
		service.hydrate().await;

		assert!(service.current_principal().is_some());
		assert!(!service.is_authenticated());
		assert_eq!(service.authorization_header(), None);
	}

	#[tokio::test]
	async fn register_establishes_the_session() {
		let (service, store, client) = test_session_service();

		client.push_register(Ok(sample_auth_response("Agent", "fresh-jwt")));

		let request = RegistrationRequest {
			username: "jdoe".into(),
			password: "hunter2".into(),
			first_name: "John".into(),
			last_name: "Doe".into(),
			email: "jdoe@example.com".into(),
			role: "Agent".into(),
			organization_id: None,
		};
		let principal =
			service.register(request).await.expect("Scripted registration should succeed.");

		assert!(service.is_authenticated());
		assert_eq!(
			store
				.load()
				.await
				.expect("Memory store load should succeed.")
				.expect("Registration should persist the principal."),
			principal,
		);
	}

	#[tokio::test]
	async fn superseded_login_does_not_persist_its_principal() {
		// The first attempt's save is still in flight when a second, rejected
		// attempt settles; backing out the stale write must leave the slot empty.
		let store_backend = Arc::new(LaggyStore::new(Duration::from_millis(50), Duration::ZERO));
		let store: Arc<dyn PrincipalStore> = store_backend.clone();
		let client = Arc::new(MockCredentialsClient::default());

		client.push_login(Ok(sample_auth_response("Lawyer", "stale-jwt")));
		client.push_login(Err(AuthApiError::Rejected {
			message: "Invalid username or password".into(),
			status: Some(401),
		}));

		let api = crate::api::AuthApi::parse("https://session-guard.test")
			.expect("Test auth API descriptor should build.");
		let service = SessionService::<MockCredentialsClient>::with_client(store, api, client);
		let (first, second) =
			tokio::join!(service.login("jdoe", "old"), service.login("jdoe", "new"));

		assert!(matches!(first, Err(Error::Superseded { .. })));
		assert!(second.is_err());
		assert!(!service.is_authenticated());
		assert!(
			store_backend.load().await.expect("Store load should succeed.").is_none(),
			"A superseded attempt must not leave its principal in storage.",
		);
	}

	#[tokio::test]
	async fn hydrate_racing_a_newer_login_keeps_the_fresh_session() {
		// Hydrate suspends in the slot read while a login completes; the stale
		// slot must not clobber the principal the login just established.
		let store_backend = Arc::new(LaggyStore::new(Duration::ZERO, Duration::from_millis(50)));
		let store: Arc<dyn PrincipalStore> = store_backend.clone();

		store_backend
			.save(sample_principal(Role::Secretary, "stored-jwt"))
			.await
			.expect("Seeding the slot should succeed.");

		let client = Arc::new(MockCredentialsClient::default());

		client.push_login(Ok(sample_auth_response("Admin", "fresh-jwt")));

		let api = crate::api::AuthApi::parse("https://session-guard.test")
			.expect("Test auth API descriptor should build.");
		let service = SessionService::<MockCredentialsClient>::with_client(store, api, client);
		let (_, login) = tokio::join!(service.hydrate(), service.login("jdoe", "hunter2"));

		login.expect("The login issued after hydrate should win.");

		assert_eq!(service.authorization_header().as_deref(), Some("Bearer fresh-jwt"));
		assert!(service.has_role(Role::Admin));
		assert!(!service.loading());
	}

	#[tokio::test]
	async fn clear_error_resets_the_message() {
		let (service, _store, client) = test_session_service();

		client.push_login(Err(AuthApiError::Rejected { message: "nope".into(), status: None }));

		let _ = service.login("jdoe", "bad").await;

		assert!(service.last_error().is_some());

		service.clear_error();

		assert_eq!(service.last_error(), None);
	}
}
