//! Authentication endpoints.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::IgnoredAny};
use tracing::instrument;

use schoolhouse_core::AuthUser;

use super::{ApiClient, ApiError, OnAuthFailure};

const LOGIN_PATH: &str = "/auth/login";
const ME_PATH: &str = "/auth/me";
const LOGOUT_PATH: &str = "/auth/logout";

/// What the user typed into the login form.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Email address, username or admission number.
    pub identifier: String,
    pub password: SecretString,
}

impl LoginCredentials {
    #[must_use]
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "access_token", alias = "accessToken")]
    token: String,
    user: AuthUser,
}

/// Exchange credentials for a bearer token and the user record.
///
/// A 401/403 here means wrong credentials, not a lost session, so the
/// auth-lost signal is never raised.
///
/// # Errors
///
/// Returns the backend's error unchanged; see [`ApiError`].
#[instrument(skip(api, credentials), fields(identifier = %credentials.identifier))]
pub async fn login(
    api: &ApiClient,
    credentials: &LoginCredentials,
) -> Result<(SecretString, AuthUser), ApiError> {
    let body = LoginRequest {
        identifier: credentials.identifier.trim(),
        password: credentials.password.expose_secret(),
    };

    let response: LoginResponse = api
        .request(Method::POST, LOGIN_PATH, Some(&body), OnAuthFailure::ReturnError)
        .await?;

    Ok((SecretString::from(response.token), response.user))
}

/// Resolve the user behind the current token.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` when the token is no longer accepted.
#[instrument(skip(api))]
pub async fn current_user(api: &ApiClient) -> Result<AuthUser, ApiError> {
    api.request::<(), AuthUser>(Method::GET, ME_PATH, None, OnAuthFailure::ReturnError)
        .await
}

/// Tell the backend to revoke the current token.
///
/// # Errors
///
/// Returns any transport or status error; callers treat this as best-effort.
#[instrument(skip(api))]
pub async fn logout(api: &ApiClient) -> Result<(), ApiError> {
    api.request::<(), IgnoredAny>(Method::POST, LOGOUT_PATH, None, OnAuthFailure::ReturnError)
        .await
        .map(|_| ())
}
