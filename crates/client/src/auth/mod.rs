//! Authentication state for the portal.
//!
//! [`AuthContext`] is the single controller that mutates the session. It
//! logs users in and out, resolves a persisted session at startup and
//! decides what a protected view may render through [`AuthContext::gate`].
//!
//! # Invariant
//!
//! A session is reported as authenticated only while the auth-lost signal
//! is down. While the signal is up the stored token is kept (so the modal
//! can clear it) but [`AuthSession::is_authenticated`] is `false` and the
//! gate answers [`GateView::SessionLost`].

pub mod error;
pub mod lost;
pub mod session;

pub use error::LoginError;
pub use lost::{
    AuthLostModal, AuthLostSignal, AuthLostState, CloseHandler, DEFAULT_AUTH_LOST_MESSAGE,
    ModalError,
};
pub use session::SessionStore;

use tracing::instrument;

use schoolhouse_core::AuthUser;

use crate::api::{self, ApiClient, auth::LoginCredentials};

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

/// What a protected view is allowed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// Startup resolution in progress: render a neutral placeholder only.
    Loading,
    /// Render the protected content for this user.
    Protected(AuthUser),
    /// The auth-lost modal owns the screen; render neither content nor a
    /// login redirect.
    SessionLost { message: String },
    /// Render the unauthenticated fallback (usually a login redirect).
    Unauthenticated,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: AuthUser,
    /// Dashboard route for the user's role.
    pub destination: &'static str,
}

/// Controller for the session and its gate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    api: ApiClient,
}

impl AuthContext {
    /// Build a context over the client's session and auth-lost signal.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub fn signal(&self) -> &AuthLostSignal {
        self.api.signal()
    }

    fn store(&self) -> &SessionStore {
        self.api.session()
    }

    /// Current authentication snapshot.
    #[must_use]
    pub fn session(&self) -> AuthSession {
        let user = self.store().user();
        let is_authenticated = user.is_some() && !self.signal().is_auth_lost();
        AuthSession {
            user,
            is_authenticated,
            is_loading: self.store().is_loading(),
        }
    }

    /// Decide what a protected view renders.
    #[must_use]
    pub fn gate(&self) -> GateView {
        if self.store().is_loading() {
            return GateView::Loading;
        }

        let lost = self.signal().state();
        if lost.is_auth_lost {
            return GateView::SessionLost {
                message: lost.message,
            };
        }

        self.store()
            .user()
            .map_or(GateView::Unauthenticated, GateView::Protected)
    }

    /// Resolve the persisted session at startup.
    ///
    /// The gate reports [`GateView::Loading`] until this returns. A token
    /// the backend rejects is dropped; when the backend cannot be reached the
    /// cached user is kept so the portal still opens offline.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> AuthSession {
        let store = self.store();
        store.set_loading(true);

        if store.load_persisted() {
            match api::auth::current_user(&self.api).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, role = %user.role, "Session restored");
                    store.update_user(user);
                }
                Err(e) if e.is_auth_failure() => {
                    tracing::info!(error = %e, "Stored session rejected, clearing");
                    store.clear();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not verify stored session, using cached user");
                }
            }
        }

        store.set_loading(false);
        self.session()
    }

    /// Log in and store the session.
    ///
    /// A successful login also lowers the auth-lost signal.
    ///
    /// # Errors
    ///
    /// Returns a [`LoginError`] describing why the attempt failed. Nothing
    /// is retried.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, LoginError> {
        let (token, user) = api::auth::login(&self.api, credentials).await.map_err(|e| {
            tracing::info!(error = %e, "Login failed");
            LoginError::from(e)
        })?;

        self.store().establish(token, user.clone());
        self.signal().hide_auth_lost();

        let destination = user.destination();
        if !user.role.is_known() {
            tracing::warn!(role = %user.role, destination, "Unrecognized role, using default destination");
        }
        tracing::info!(user_id = %user.id, role = %user.role, destination, "Logged in");

        Ok(LoginOutcome { user, destination })
    }

    /// Log out. Idempotent.
    ///
    /// The backend is told to revoke the token when there is one; a failure
    /// there is logged and does not keep the local session alive.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.store().has_token()
            && let Err(e) = api::auth::logout(&self.api).await
        {
            tracing::warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }

        self.store().clear();
        tracing::info!("Logged out");
    }
}
