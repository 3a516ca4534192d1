//! Rust’s turnkey client-session core—hydrate persisted principals, broker credential logins,
//! and guard role-gated routes in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod error;
pub mod guard;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use parking_lot::Mutex;

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::AuthApi,
		auth::{Principal, Role},
		error::AuthApiError,
		http::{ApiFuture, AuthResponse, Credentials, CredentialsClient, RegistrationRequest, WireId},
		session::SessionService,
		store::{MemoryStore, PrincipalStore},
	};
	#[cfg(feature = "reqwest")] use crate::http::ReqwestCredentialsClient;

	#[cfg(feature = "reqwest")]
	/// Session service type alias used by reqwest-backed integration tests.
	pub type ReqwestTestSession = SessionService<ReqwestCredentialsClient>;

	/// Scripted [`CredentialsClient`] that replays queued outcomes and counts calls.
	///
	/// Each operation pops the front of its script; an empty script panics, which keeps
	/// fixtures honest about how many network calls a scenario is expected to make.
	#[derive(Debug, Default)]
	pub struct MockCredentialsClient {
		login_script: Mutex<VecDeque<Result<AuthResponse, AuthApiError>>>,
		register_script: Mutex<VecDeque<Result<AuthResponse, AuthApiError>>>,
		calls: AtomicUsize,
	}
	impl MockCredentialsClient {
		/// Queues the next login outcome.
		pub fn push_login(&self, outcome: Result<AuthResponse, AuthApiError>) {
			self.login_script.lock().push_back(outcome);
		}

		/// Queues the next registration outcome.
		pub fn push_register(&self, outcome: Result<AuthResponse, AuthApiError>) {
			self.register_script.lock().push_back(outcome);
		}

		/// Total number of login + register calls observed so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl CredentialsClient for MockCredentialsClient {
		fn login<'a>(
			&'a self,
			_endpoint: &'a Url,
			_credentials: &'a Credentials,
		) -> ApiFuture<'a, AuthResponse> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let outcome = self
				.login_script
				.lock()
				.pop_front()
				.expect("Mock login script is empty; queue an outcome with push_login first.");

			Box::pin(async move { outcome })
		}

		fn register<'a>(
			&'a self,
			_endpoint: &'a Url,
			_request: &'a RegistrationRequest,
		) -> ApiFuture<'a, AuthResponse> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let outcome = self
				.register_script
				.lock()
				.pop_front()
				.expect("Mock register script is empty; queue an outcome with push_register first.");

			Box::pin(async move { outcome })
		}
	}

	/// Canonical wire response fixture matching the auth service contract.
	pub fn sample_auth_response(role: &str, token: &str) -> AuthResponse {
		AuthResponse {
			user_id: WireId::Number(17),
			username: "jdoe".into(),
			first_name: "John".into(),
			last_name: "Doe".into(),
			email: "jdoe@example.com".into(),
			role: role.into(),
			law_firm_id: Some(WireId::Number(3)),
			agency_id: None,
			token: token.into(),
		}
	}

	/// Principal fixture mirroring [`sample_auth_response`] after the wire mapping.
	pub fn sample_principal(role: Role, token: &str) -> Principal {
		Principal::builder(
			"17".parse().expect("Sample principal id should be valid."),
			role,
		)
		.username("jdoe")
		.display_name("John Doe")
		.email("jdoe@example.com")
		.organization("3".parse().expect("Sample organization id should be valid."))
		.token(token)
		.build()
		.expect("Sample principal fixture should build.")
	}

	/// Constructs a [`SessionService`] backed by an in-memory store and a scripted mock client.
	pub fn test_session_service()
	-> (SessionService<MockCredentialsClient>, Arc<MemoryStore>, Arc<MockCredentialsClient>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn PrincipalStore> = store_backend.clone();
		let client = Arc::new(MockCredentialsClient::default());
		let api = AuthApi::parse("https://session-guard.test")
			.expect("Test auth API descriptor should build.");
		let service = SessionService::with_client(store, api, client.clone());

		(service, store_backend, client)
	}

	#[cfg(feature = "reqwest")]
	/// Builds a reqwest credentials client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_credentials_client() -> ReqwestCredentialsClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestCredentialsClient::with_client(client)
	}

	#[cfg(feature = "reqwest")]
	/// Constructs a [`SessionService`] wired to the reqwest transport used across
	/// integration tests, backed by an in-memory store.
	pub fn build_reqwest_test_session(api: AuthApi) -> (ReqwestTestSession, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn PrincipalStore> = store_backend.clone();
		let service = SessionService::with_client(store, api, test_reqwest_credentials_client());

		(service, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, session_guard as _};
