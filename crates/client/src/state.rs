//! Portal state shared across the front-end.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{
    AuthContext, AuthLostModal, AuthLostSignal, AuthSession, CloseHandler, ModalError,
    SessionStore,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::storage::{FileStore, KeyValueStore};
use crate::theme::ThemeContext;
use crate::timers::{Carousel, PeriodRefresher};

/// Everything a running portal client shares.
///
/// This struct is cheaply cloneable via `Arc`. It owns one instance of each
/// piece of process-wide state: storage, theme, session and the auth-lost
/// signal.
#[derive(Debug, Clone)]
pub struct PortalState {
    inner: Arc<PortalStateInner>,
}

#[derive(Debug)]
struct PortalStateInner {
    config: ClientConfig,
    theme: ThemeContext,
    auth: AuthContext,
    api: ApiClient,
}

impl PortalState {
    /// Create portal state over `storage`.
    ///
    /// Persisted theme settings are loaded right away; the session stays in
    /// the loading state until [`PortalState::start`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let theme = ThemeContext::load(Arc::clone(&storage));
        let session = SessionStore::new(storage);
        let signal = AuthLostSignal::new(session.clone());
        let api = ApiClient::new(config.api_url.clone(), config.request_timeout, session, signal)?;
        let auth = AuthContext::new(api.clone());

        Ok(Self {
            inner: Arc::new(PortalStateInner {
                config,
                theme,
                auth,
                api,
            }),
        })
    }

    /// Create portal state backed by the storage file named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = Arc::new(FileStore::new(config.storage_path.clone()));
        tracing::debug!(path = %storage.path().display(), "Using file storage");
        Self::new(config, storage)
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn theme(&self) -> &ThemeContext {
        &self.inner.theme
    }

    #[must_use]
    pub fn auth(&self) -> &AuthContext {
        &self.inner.auth
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Resolve the persisted session, then refresh design settings.
    ///
    /// A failed settings refresh is logged and leaves the persisted
    /// settings in place.
    pub async fn start(&self) -> AuthSession {
        let session = self.auth().restore().await;

        if let Err(e) = self.theme().sync(self.api()).await {
            tracing::warn!(error = %e, "Could not refresh design settings, using cached values");
        }

        session
    }

    /// Mount the single auth-lost modal.
    ///
    /// # Errors
    ///
    /// Returns [`ModalError::AlreadyMounted`] while another one is alive.
    pub fn mount_auth_lost_modal(
        &self,
        on_close: Option<CloseHandler>,
    ) -> Result<AuthLostModal, ModalError> {
        self.auth().signal().mount_modal(on_close)
    }

    /// Start polling the current period at the configured cadence.
    #[must_use]
    pub fn refresh_period(&self) -> PeriodRefresher {
        PeriodRefresher::spawn(self.api().clone(), self.config().period_refresh_interval)
    }

    /// Start a carousel over `slides` at the configured interval.
    #[must_use]
    pub fn carousel(&self, slides: usize) -> Carousel {
        Carousel::start(slides, self.config().carousel_interval)
    }
}
