//! Storage contract and built-in backends for the persisted principal.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Principal};

/// Boxed future returned by [`PrincipalStore`] implementations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the session's single principal slot.
///
/// The slot holds at most one flat-JSON principal with no versioning. It is
/// written on login, read at startup, and deleted on logout; no other component
/// may write to this location.
pub trait PrincipalStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the stored principal.
	fn save(&self, principal: Principal) -> StoreFuture<'_, ()>;

	/// Fetches the stored principal, if present.
	fn load(&self) -> StoreFuture<'_, Option<Principal>>;

	/// Removes the stored principal. Clearing an empty slot is a no-op.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`PrincipalStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
