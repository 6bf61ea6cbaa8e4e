//! Top-level error for callers that drive the whole client.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::{LoginError, ModalError};
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Any error the client surfaces.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Login failed: {0}")]
    Login(#[from] LoginError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Modal error: {0}")]
    Modal(#[from] ModalError),

    #[error("Stylesheet rendering failed: {0}")]
    Render(#[from] askama::Error),

    /// The command needs a logged-in user.
    #[error("Not logged in")]
    NotLoggedIn,
}

impl ClientError {
    /// Whether this points at a bug or outage worth reporting, as opposed to
    /// bad input or an expired session.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(e) => matches!(e, ApiError::Server { .. } | ApiError::Decode(_)),
            Self::Login(e) => matches!(e, LoginError::Server(_)),
            Self::Storage(_) | Self::Render(_) => true,
            Self::Config(_) | Self::Modal(_) | Self::NotLoggedIn => false,
        }
    }
}
