//! Global "session lost" signal and the modal that answers it.
//!
//! Any collaborator that learns the session is no longer valid (usually the
//! REST client on a 401/403) raises the signal. Exactly one
//! [`AuthLostModal`] may be mounted at a time; it is the only piece that
//! turns the signal into a logout and navigation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use super::SessionStore;
use crate::routes;

/// Message shown when the caller does not supply one.
pub const DEFAULT_AUTH_LOST_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Snapshot of the signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthLostState {
    pub is_auth_lost: bool,
    pub message: String,
}

/// Errors from mounting or driving the modal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModalError {
    #[error("an auth-lost modal is already mounted")]
    AlreadyMounted,
}

/// Invoked when the modal is dismissed with its cancel action.
pub type CloseHandler = Box<dyn Fn() + Send + Sync>;

/// Shared handle to the auth-lost signal.
#[derive(Clone)]
pub struct AuthLostSignal {
    inner: Arc<AuthLostInner>,
}

struct AuthLostInner {
    session: SessionStore,
    state: watch::Sender<AuthLostState>,
    modal_mounted: AtomicBool,
}

impl std::fmt::Debug for AuthLostSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthLostSignal")
            .field("state", &self.state())
            .field("modal_mounted", &self.inner.modal_mounted.load(Ordering::Acquire))
            .finish()
    }
}

impl AuthLostSignal {
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        let (tx, _) = watch::channel(AuthLostState::default());
        Self {
            inner: Arc::new(AuthLostInner {
                session,
                state: tx,
                modal_mounted: AtomicBool::new(false),
            }),
        }
    }

    fn publish(&self, next: AuthLostState) {
        self.inner.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Raise the signal without touching the session.
    pub fn show_auth_lost(&self, message: Option<&str>) {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_AUTH_LOST_MESSAGE)
            .to_owned();
        tracing::info!(%message, "Authentication lost");
        self.publish(AuthLostState {
            is_auth_lost: true,
            message,
        });
    }

    /// Raise the signal and drop the session immediately.
    pub fn handle_auth_lost(&self, message: Option<&str>) {
        self.inner.session.clear();
        self.show_auth_lost(message);
    }

    /// Lower the signal. Idempotent.
    pub fn hide_auth_lost(&self) {
        self.publish(AuthLostState::default());
    }

    #[must_use]
    pub fn state(&self) -> AuthLostState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn is_auth_lost(&self) -> bool {
        self.state().is_auth_lost
    }

    /// Receiver that yields every change of the signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthLostState> {
        self.inner.state.subscribe()
    }

    /// Mount the modal.
    ///
    /// `on_close` enables [`AuthLostModal::cancel`]; without it the only
    /// way out of the modal is logging in again.
    ///
    /// # Errors
    ///
    /// Returns [`ModalError::AlreadyMounted`] while another modal is alive.
    pub fn mount_modal(&self, on_close: Option<CloseHandler>) -> Result<AuthLostModal, ModalError> {
        self.inner
            .modal_mounted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ModalError::AlreadyMounted)?;

        Ok(AuthLostModal {
            signal: self.clone(),
            on_close,
        })
    }
}

/// The single modal rendered from the auth-lost signal.
///
/// Unmounts when dropped.
pub struct AuthLostModal {
    signal: AuthLostSignal,
    on_close: Option<CloseHandler>,
}

impl std::fmt::Debug for AuthLostModal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthLostModal")
            .field("visible", &self.is_visible())
            .field("can_cancel", &self.can_cancel())
            .finish()
    }
}

impl AuthLostModal {
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.signal.is_auth_lost()
    }

    /// Message to display, or `None` while hidden.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let state = self.signal.state();
        state.is_auth_lost.then_some(state.message)
    }

    /// Whether a cancel action is available.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.on_close.is_some()
    }

    /// "Log In Again": drop stored tokens, hide, and return the route to
    /// navigate to.
    pub fn relogin(&self) -> &'static str {
        self.signal.inner.session.clear();
        self.signal.hide_auth_lost();
        tracing::info!(route = routes::ENTRY, "Re-login requested from auth-lost modal");
        routes::ENTRY
    }

    /// Hide the modal without logging out or navigating.
    ///
    /// Returns `false` and leaves the modal up when no `on_close` handler
    /// was supplied at mount time.
    pub fn cancel(&self) -> bool {
        let Some(on_close) = &self.on_close else {
            return false;
        };
        self.signal.hide_auth_lost();
        on_close();
        true
    }
}

impl Drop for AuthLostModal {
    fn drop(&mut self) {
        self.signal
            .inner
            .modal_mounted
            .store(false, Ordering::Release);
    }
}
