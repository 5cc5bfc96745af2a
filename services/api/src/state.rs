//! Application state shared across request handlers.

use std::sync::Arc;

use crate::db::EntityStore;
use crate::identity::{PasswordHasher, TokenService};
use crate::lifecycle::accounts::Credentials;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn EntityStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: Arc<dyn EntityStore>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                tokens,
                hasher,
            }),
        }
    }

    /// Get a reference to the entity store.
    pub fn store(&self) -> &dyn EntityStore {
        self.inner.store.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            hasher: &self.inner.hasher,
            tokens: &self.inner.tokens,
        }
    }

    /// State over a fresh in-memory store.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        use crate::db::MemoryStore;

        Self::new(
            Arc::new(MemoryStore::new()),
            TokenService::new(b"unit-test-secret", chrono::Duration::minutes(30)),
            PasswordHasher::new(),
        )
    }
}
