//! Session storage: the bearer token and the logged-in user.
//!
//! [`SessionStore`] is the single writer of session state. It keeps the
//! in-memory snapshot and the persisted copy (token + cached user) in step.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use schoolhouse_core::AuthUser;

use crate::storage::{KeyValueStore, get_json, keys, set_json};

/// Bearer token as persisted in local storage.
#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    user: Option<AuthUser>,
    is_loading: bool,
    /// Bumped whenever the token is replaced or dropped.
    generation: u64,
}

/// Shared handle to the current session.
///
/// Cheap to clone; every clone sees the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("token", &state.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &state.user)
            .field("is_loading", &state.is_loading)
            .finish()
    }
}

impl SessionStore {
    /// Create an empty session in the loading state.
    ///
    /// Nothing is read from storage until [`SessionStore::load_persisted`].
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                state: RwLock::new(SessionState {
                    is_loading: true,
                    ..SessionState::default()
                }),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pull the persisted token and cached user into memory.
    ///
    /// Returns whether a token was found. A cached user without a token is
    /// discarded.
    pub fn load_persisted(&self) -> bool {
        let storage = self.inner.storage.as_ref();
        let token = get_json::<StoredToken>(storage, keys::AUTH_TOKEN)
            .map(|stored| SecretString::from(stored.token));
        let user = token
            .as_ref()
            .and_then(|_| get_json::<AuthUser>(storage, keys::CURRENT_USER));

        let found = token.is_some();
        let mut state = self.write();
        state.token = token;
        state.user = user;
        state.generation += 1;
        found
    }

    /// Record a freshly authenticated session and persist it.
    ///
    /// Persistence failures are logged; the in-memory session still applies.
    pub fn establish(&self, token: SecretString, user: AuthUser) {
        use secrecy::ExposeSecret;

        let storage = self.inner.storage.as_ref();
        let stored = StoredToken {
            token: token.expose_secret().to_owned(),
        };
        if let Err(e) = set_json(storage, keys::AUTH_TOKEN, &stored) {
            tracing::warn!(error = %e, "Failed to persist auth token");
        }
        if let Err(e) = set_json(storage, keys::CURRENT_USER, &user) {
            tracing::warn!(error = %e, "Failed to persist current user");
        }

        let mut state = self.write();
        state.token = Some(token);
        state.user = Some(user);
        state.is_loading = false;
        state.generation += 1;
    }

    /// Replace the cached user while keeping the token.
    pub fn update_user(&self, user: AuthUser) {
        if let Err(e) = set_json(self.inner.storage.as_ref(), keys::CURRENT_USER, &user) {
            tracing::warn!(error = %e, "Failed to persist current user");
        }
        self.write().user = Some(user);
    }

    /// Drop the session from memory and storage. Idempotent.
    pub fn clear(&self) {
        let storage = self.inner.storage.as_ref();
        for key in [keys::AUTH_TOKEN, keys::CURRENT_USER] {
            if let Err(e) = storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove session key");
            }
        }

        let mut state = self.write();
        if state.token.is_some() {
            state.generation += 1;
        }
        state.token = None;
        state.user = None;
        state.is_loading = false;
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.write().is_loading = is_loading;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read().token.clone()
    }

    /// The current token together with the session generation it belongs
    /// to.
    ///
    /// A request that fails with this token can compare the generation
    /// against [`SessionStore::generation`] to tell whether the session has
    /// since been replaced.
    #[must_use]
    pub fn credentials(&self) -> (Option<SecretString>, u64) {
        let state = self.read();
        (state.token.clone(), state.generation)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.read().token.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.read().user.clone()
    }
}
