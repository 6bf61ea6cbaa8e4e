//! Command implementations.
//!
//! Each command writes its human-readable result to the writer it is given
//! and logs through `tracing`.

pub mod auth;
pub mod period;
pub mod settings;
pub mod theme;

use std::io;
use std::path::PathBuf;

use schoolhouse_client::ClientError;
use schoolhouse_client::api::ApiError;
use schoolhouse_client::auth::LoginError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Writing to stdout failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("Failed to read settings file {path}: {source}")]
    SettingsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Settings file {path} is not valid JSON: {source}")]
    SettingsJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CommandError {
    /// Whether the error should be sent to Sentry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_reportable(),
            Self::Output(_) | Self::SettingsFile { .. } | Self::SettingsJson { .. } => false,
        }
    }
}

impl From<ApiError> for CommandError {
    fn from(error: ApiError) -> Self {
        Self::Client(error.into())
    }
}

impl From<LoginError> for CommandError {
    fn from(error: LoginError) -> Self {
        Self::Client(error.into())
    }
}
