//! REST client for the school backend.
//!
//! Every data fetcher goes through [`ApiClient`]. It attaches the bearer
//! token from the [`SessionStore`], maps HTTP statuses onto [`ApiError`] and
//! escalates 401/403 on authenticated requests to the [`AuthLostSignal`].
//!
//! # Endpoints
//!
//! - [`auth`] - login, current user, logout
//! - [`design`] - admin design settings
//! - [`period`] - the timetable period in progress

pub mod auth;
pub mod design;
pub mod period;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::auth::{AuthLostSignal, DEFAULT_AUTH_LOST_MESSAGE, SessionStore};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Field name → messages, as returned with a validation error.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401 from the backend.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403 from the backend.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 400/422 with a message and optional per-field messages.
    #[error("validation failed: {message}")]
    Validation { message: String, fields: FieldErrors },

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other 4xx.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request path {path}: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// Whether this error means the session is no longer valid.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }

    /// Whether retrying by hand might succeed (network trouble or a 5xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

/// What to do when an authenticated request comes back 401/403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnAuthFailure {
    /// Raise the auth-lost signal, then return the error.
    RaiseSignal,
    /// Only return the error. Used by login and background polling.
    ReturnError,
}

/// Error body shape shared by the backend's endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<ErrorFields>,
}

/// The backend sends either one message or a list per field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    One(String),
    Many(Vec<String>),
}

type ErrorFields = BTreeMap<String, FieldMessages>;

impl ErrorBody {
    fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_else(|_| Self {
            message: std::str::from_utf8(bytes)
                .ok()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
            ..Self::default()
        })
    }

    fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| fallback.to_owned())
    }

    fn field_errors(self) -> FieldErrors {
        self.errors
            .unwrap_or_default()
            .into_iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    FieldMessages::One(message) => vec![message],
                    FieldMessages::Many(messages) => messages,
                };
                (field, messages)
            })
            .collect()
    }
}

/// Client for the school backend's JSON API.
///
/// Cheap to clone; clones share the HTTP connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    signal: AuthLostSignal,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        session: SessionStore,
        signal: AuthLostSignal,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: with_trailing_slash(base_url),
                session,
                signal,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn signal(&self) -> &AuthLostSignal {
        &self.inner.signal
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidPath {
                path: path.to_owned(),
                source,
            })
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, path, None, OnAuthFailure::RaiseSignal)
            .await
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(body), OnAuthFailure::RaiseSignal)
            .await
    }

    /// PUT a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(body), OnAuthFailure::RaiseSignal)
            .await
    }

    /// Send a request and decode the response.
    ///
    /// An empty success body decodes as JSON `null`, so `Option<T>` targets
    /// accept `204 No Content`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, body))]
    pub async fn request<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        on_auth_failure: OnAuthFailure,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let (token, generation) = self.inner.session.credentials();

        let mut request = self
            .inner
            .http
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(token) = &token {
            request = request.header("Authorization", format!("Bearer {}", token.expose_secret()));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
                b"null"
            } else {
                &bytes
            };
            return Ok(serde_json::from_slice(payload)?);
        }

        let error = map_error_status(status, path, ErrorBody::parse(&bytes));
        tracing::debug!(status = status.as_u16(), error = %error, "Request failed");

        if error.is_auth_failure()
            && token.is_some()
            && on_auth_failure == OnAuthFailure::RaiseSignal
        {
            // Session replaced or dropped while the request was in flight.
            if self.inner.session.generation() != generation {
                tracing::debug!(
                    status = status.as_u16(),
                    "Ignoring auth failure for a replaced session"
                );
                return Err(error);
            }
            let message = match &error {
                ApiError::Unauthorized(message) | ApiError::Forbidden(message) => {
                    Some(message.as_str())
                }
                _ => None,
            };
            self.inner.signal.show_auth_lost(message);
        }

        Err(error)
    }
}

fn map_error_status(status: StatusCode, path: &str, body: ErrorBody) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => {
            ApiError::Unauthorized(body.message_or(DEFAULT_AUTH_LOST_MESSAGE))
        }
        StatusCode::FORBIDDEN => {
            ApiError::Forbidden(body.message_or("You do not have access to this resource."))
        }
        StatusCode::NOT_FOUND => ApiError::NotFound(path.to_owned()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let message = body.message_or("The request could not be processed.");
            ApiError::Validation {
                message,
                fields: body.field_errors(),
            }
        }
        status if status.is_server_error() => ApiError::Server {
            status: status.as_u16(),
            message: body.message_or("The server encountered an error."),
        },
        status => ApiError::Rejected {
            status: status.as_u16(),
            message: body.message_or("The request was rejected."),
        },
    }
}

/// `Url::join` drops the last path segment unless it ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
