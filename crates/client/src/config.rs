//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SCHOOLHOUSE_API_URL` - Base URL of the school backend API
//!
//! ## Optional
//! - `SCHOOLHOUSE_STORAGE_PATH` - Local storage file (default: `<data dir>/schoolhouse/storage.json`)
//! - `SCHOOLHOUSE_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `SCHOOLHOUSE_PERIOD_REFRESH_SECS` - Current-period polling cadence (default: 60)
//! - `SCHOOLHOUSE_CAROUSEL_INTERVAL_SECS` - Carousel slide duration (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::api::DEFAULT_TIMEOUT;
use crate::timers::{carousel::DEFAULT_INTERVAL, period::DEFAULT_REFRESH_INTERVAL};

const STORAGE_FILE: &str = "storage.json";
const APP_DIR: &str = "schoolhouse";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API root, e.g. `https://school.example/api`
    pub api_url: Url,
    /// File backing local storage
    pub storage_path: PathBuf,
    pub request_timeout: Duration,
    pub period_refresh_interval: Duration,
    pub carousel_interval: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let raw_url = env.required("SCHOOLHOUSE_API_URL")?;
        let api_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SCHOOLHOUSE_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SCHOOLHOUSE_API_URL".to_string(),
                format!("unsupported scheme {}", api_url.scheme()),
            ));
        }

        let storage_path = env
            .optional("SCHOOLHOUSE_STORAGE_PATH")
            .map_or_else(default_storage_path, PathBuf::from);

        Ok(Self {
            api_url,
            storage_path,
            request_timeout: env.seconds("SCHOOLHOUSE_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT)?,
            period_refresh_interval: env
                .seconds("SCHOOLHOUSE_PERIOD_REFRESH_SECS", DEFAULT_REFRESH_INTERVAL)?,
            carousel_interval: env.seconds("SCHOOLHOUSE_CAROUSEL_INTERVAL_SECS", DEFAULT_INTERVAL)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Platform data directory, falling back to the working directory.
#[must_use]
pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(STORAGE_FILE)
}

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn seconds(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            )),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        }
    }
}
