//! Integration tests for the Schoolhouse portal client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p schoolhouse-integration-tests
//! ```
//!
//! Each test starts a [`MockBackend`], an in-process axum server on an
//! ephemeral port that speaks the school backend's JSON API, and drives a
//! real [`PortalState`] against it.
//!
//! # Test Categories
//!
//! - `auth_flow` - Login, role redirect, logout and session restore
//! - `auth_lost` - 401 during a fetch and the auth-lost modal
//! - `theme_sync` - Design settings sync and mode precedence
//! - `period_refresh` - Best-effort period polling

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use schoolhouse_client::storage::KeyValueStore;
use schoolhouse_client::{ClientConfig, ClientError, PortalState};
use schoolhouse_core::UserRole;

pub use axum::http::StatusCode as HttpStatus;

/// What `GET /api/periods/current` answers.
#[derive(Debug, Clone)]
pub enum PeriodReply {
    /// 200 with this period.
    Running(Value),
    /// 204, no lesson in progress.
    Idle,
    /// An error status.
    Fail(StatusCode),
}

struct Account {
    password: String,
    user: Value,
}

struct Backend {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, Value>>,
    design: Mutex<Value>,
    period: Mutex<PeriodReply>,
    issued: AtomicUsize,
    design_delay: Mutex<Duration>,
    design_calls: AtomicUsize,
    period_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the school backend.
///
/// The server stops when this is dropped.
pub struct MockBackend {
    base_url: Url,
    backend: Arc<Backend>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let backend = Arc::new(Backend {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            design: Mutex::new(json!({})),
            period: Mutex::new(PeriodReply::Idle),
            issued: AtomicUsize::new(0),
            design_delay: Mutex::new(Duration::ZERO),
            design_calls: AtomicUsize::new(0),
            period_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/auth/logout", post(logout))
            .route("/api/design-settings", get(get_design).put(put_design))
            .route("/api/periods/current", get(current_period))
            .with_state(Arc::clone(&backend));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind mock backend: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock backend has no address: {e}"));

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api"))
            .unwrap_or_else(|e| panic!("invalid mock backend url: {e}"));

        Self {
            base_url,
            backend,
            server,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Register an account that can log in.
    pub fn add_user(&self, identifier: &str, password: &str, id: i64, name: &str, role: &str) {
        lock(&self.backend.accounts).insert(
            identifier.to_owned(),
            Account {
                password: password.to_owned(),
                user: json!({
                    "id": id,
                    "name": name,
                    "email": identifier,
                    "role": role,
                }),
            },
        );
    }

    /// Invalidate every issued token, as if the sessions expired server-side.
    pub fn expire_sessions(&self) {
        lock(&self.backend.tokens).clear();
    }

    /// Replace the stored design settings (backend JSON shape).
    pub fn set_design(&self, design: Value) {
        *lock(&self.backend.design) = design;
    }

    #[must_use]
    pub fn design(&self) -> Value {
        lock(&self.backend.design).clone()
    }

    /// Hold `GET /api/design-settings` for `delay` before checking the token.
    pub fn delay_design(&self, delay: Duration) {
        *lock(&self.backend.design_delay) = delay;
    }

    /// Number of `GET /api/design-settings` requests received so far.
    #[must_use]
    pub fn design_calls(&self) -> usize {
        self.backend.design_calls.load(Ordering::SeqCst)
    }

    pub fn set_period(&self, reply: PeriodReply) {
        *lock(&self.backend.period) = reply;
    }

    #[must_use]
    pub fn period_calls(&self) -> usize {
        self.backend.period_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.backend.logout_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        lock(&self.backend.tokens).len()
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url.clone(),
            storage_path: "unused-storage.json".into(),
            request_timeout: Duration::from_secs(5),
            period_refresh_interval: Duration::from_millis(50),
            carousel_interval: Duration::from_secs(5),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Portal state talking to this backend over `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn portal(&self, storage: Arc<dyn KeyValueStore>) -> Result<PortalState, ClientError> {
        PortalState::new(self.config(), storage)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The user behind the request's token; `Err` is the 401 to send back.
fn authenticate(backend: &Backend, headers: &HeaderMap) -> Result<Option<Value>, Response> {
    let Some(token) = bearer(headers) else {
        return Ok(None);
    };
    lock(&backend.tokens)
        .get(token)
        .cloned()
        .map(Some)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Session expired, please log in again"))
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    password: String,
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<LoginBody>) -> Response {
    if body.identifier.is_empty() || body.password.is_empty() {
        let mut errors = serde_json::Map::new();
        if body.identifier.is_empty() {
            errors.insert("identifier".into(), json!("is required"));
        }
        if body.password.is_empty() {
            errors.insert("password".into(), json!(["is required"]));
        }
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Invalid input", "errors": errors })),
        )
            .into_response();
    }

    let user = {
        let accounts = lock(&backend.accounts);
        match accounts.get(&body.identifier) {
            Some(account) if account.password == body.password => account.user.clone(),
            _ => return error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        }
    };

    let n = backend.issued.fetch_add(1, Ordering::SeqCst);
    let token = format!("token-{n}");
    lock(&backend.tokens).insert(token.clone(), user.clone());

    Json(json!({ "token": token, "user": user })).into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    match authenticate(&backend, &headers) {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => error(StatusCode::UNAUTHORIZED, "Not authenticated"),
        Err(response) => response,
    }
}

async fn logout(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.logout_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(token) = bearer(&headers) {
        lock(&backend.tokens).remove(token);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn get_design(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.design_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *lock(&backend.design_delay);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if let Err(response) = authenticate(&backend, &headers) {
        return response;
    }
    Json(lock(&backend.design).clone()).into_response()
}

async fn put_design(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match authenticate(&backend, &headers) {
        Ok(Some(user)) => user,
        Ok(None) => return error(StatusCode::UNAUTHORIZED, "Not authenticated"),
        Err(response) => return response,
    };
    let role = UserRole::parse(user["role"].as_str().unwrap_or_default());
    if !role.is_administrator() {
        return error(StatusCode::FORBIDDEN, "Only administrators can change design settings");
    }

    *lock(&backend.design) = body.clone();
    Json(body).into_response()
}

async fn current_period(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.period_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = authenticate(&backend, &headers) {
        return response;
    }
    match lock(&backend.period).clone() {
        PeriodReply::Running(period) => Json(period).into_response(),
        PeriodReply::Idle => StatusCode::NO_CONTENT.into_response(),
        PeriodReply::Fail(status) => error(status, "Timetable service unavailable"),
    }
}
