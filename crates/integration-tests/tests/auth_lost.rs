//! Integration tests for the auth-lost signal and its modal.
//!
//! A 401/403 on an authenticated request raises the signal; the single
//! modal then owns the screen until the user logs in again or cancels.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use schoolhouse_client::api::ApiError;
use schoolhouse_client::api::auth::LoginCredentials;
use schoolhouse_client::auth::GateView;
use schoolhouse_client::storage::{KeyValueStore, MemoryStore, keys};
use schoolhouse_client::timers::RefreshOutcome;
use schoolhouse_client::{PortalState, routes};
use schoolhouse_integration_tests::MockBackend;

const SESSION_EXPIRED: &str = "Session expired, please log in again";

async fn signed_in() -> (MockBackend, Arc<MemoryStore>, PortalState) {
    let backend = MockBackend::start().await;
    backend.add_user("tunde@school.test", "exercise-book", 8, "Tunde Bello", "student");

    let storage = Arc::new(MemoryStore::new());
    let portal = backend.portal(storage.clone()).unwrap();
    portal
        .auth()
        .login(&LoginCredentials::new("tunde@school.test", "exercise-book"))
        .await
        .unwrap();

    (backend, storage, portal)
}

// =============================================================================
// Raising the signal
// =============================================================================

#[tokio::test]
async fn test_401_during_fetch_shows_modal_and_relogin_clears_tokens() {
    let (backend, storage, portal) = signed_in().await;
    let modal = portal.mount_auth_lost_modal(None).unwrap();
    assert!(!modal.is_visible());

    backend.expire_sessions();
    let error = portal.theme().sync(portal.api()).await.unwrap_err();
    assert!(matches!(error, ApiError::Unauthorized(_)));

    // Modal is up with the backend's message; the session is not yet cleared.
    assert!(modal.is_visible());
    assert_eq!(modal.message().as_deref(), Some(SESSION_EXPIRED));
    assert!(!portal.auth().session().is_authenticated);
    assert_eq!(
        portal.auth().gate(),
        GateView::SessionLost {
            message: SESSION_EXPIRED.to_string()
        }
    );
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_some());

    // "Log In Again"
    assert_eq!(modal.relogin(), routes::ENTRY);
    assert!(!modal.is_visible());
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_none());
    assert!(storage.get(keys::CURRENT_USER).unwrap().is_none());
    assert_eq!(portal.auth().gate(), GateView::Unauthenticated);
}

#[tokio::test]
async fn test_anonymous_401_does_not_raise_signal() {
    let backend = MockBackend::start().await;
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();

    let session = portal.auth().restore().await;
    assert!(!session.is_authenticated);

    let me = schoolhouse_client::api::auth::current_user(portal.api()).await;
    assert!(matches!(me, Err(ApiError::Unauthorized(_))));
    assert!(!portal.auth().signal().is_auth_lost());
}

#[tokio::test]
async fn test_background_poll_failure_stays_silent() {
    let (backend, _storage, portal) = signed_in().await;
    backend.expire_sessions();

    let outcome = RefreshOutcome::fetch(portal.api()).await;
    assert!(outcome.is_failure());
    assert!(!portal.auth().signal().is_auth_lost());
}

#[tokio::test]
async fn test_late_401_for_replaced_session_is_ignored() {
    let (backend, storage, portal) = signed_in().await;
    let modal = portal.mount_auth_lost_modal(None).unwrap();
    backend.delay_design(Duration::from_millis(300));

    // Sent with the first token, answered after a fresh login replaced it.
    let (stale, ()) = tokio::join!(portal.theme().sync(portal.api()), async {
        while backend.design_calls() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        backend.expire_sessions();
        portal
            .auth()
            .login(&LoginCredentials::new("tunde@school.test", "exercise-book"))
            .await
            .unwrap();
    });

    assert!(matches!(stale, Err(ApiError::Unauthorized(_))));
    assert!(!modal.is_visible());
    assert!(portal.auth().session().is_authenticated);
    assert!(matches!(portal.auth().gate(), GateView::Protected(_)));
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_some());
    assert_eq!(backend.active_sessions(), 1);
}

// =============================================================================
// Leaving the modal
// =============================================================================

#[tokio::test]
async fn test_cancel_hides_without_logging_out() {
    let (backend, storage, portal) = signed_in().await;
    let closed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&closed);
    let modal = portal
        .mount_auth_lost_modal(Some(Box::new(move || flag.store(true, Ordering::SeqCst))))
        .unwrap();

    backend.expire_sessions();
    portal.theme().sync(portal.api()).await.unwrap_err();
    assert!(modal.can_cancel());

    assert!(modal.cancel());
    assert!(closed.load(Ordering::SeqCst));
    assert!(!modal.is_visible());
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_some());
}

#[tokio::test]
async fn test_logging_in_again_lowers_signal() {
    let (backend, _storage, portal) = signed_in().await;
    backend.expire_sessions();
    portal.theme().sync(portal.api()).await.unwrap_err();
    assert!(portal.auth().signal().is_auth_lost());

    portal
        .auth()
        .login(&LoginCredentials::new("tunde@school.test", "exercise-book"))
        .await
        .unwrap();

    assert!(!portal.auth().signal().is_auth_lost());
    assert!(portal.auth().session().is_authenticated);
    assert!(portal.theme().sync(portal.api()).await.is_ok());
}

#[tokio::test]
async fn test_hide_twice_leaves_signal_down() {
    let (_backend, _storage, portal) = signed_in().await;
    let signal = portal.auth().signal();
    signal.show_auth_lost(None);

    signal.hide_auth_lost();
    signal.hide_auth_lost();
    assert!(!signal.is_auth_lost());
    assert!(portal.auth().session().is_authenticated);
}
