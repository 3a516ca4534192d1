//! Thread-safe in-memory [`PrincipalStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::Principal,
	store::{PrincipalStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<Principal>>>;

/// Thread-safe backend that keeps the principal in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl PrincipalStore for MemoryStore {
	fn save(&self, principal: Principal) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(principal);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<Principal>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = None;

			Ok(())
		})
	}
}
