//! Integration tests for login, role redirect, logout and session restore.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use schoolhouse_client::api::auth::LoginCredentials;
use schoolhouse_client::auth::{GateView, LoginError};
use schoolhouse_client::storage::{KeyValueStore, MemoryStore, keys};
use schoolhouse_core::{Section, UserRole};
use schoolhouse_integration_tests::MockBackend;

async fn backend() -> MockBackend {
    let backend = MockBackend::start().await;
    backend.add_user("amaka@school.test", "chalk-and-board", 2, "Amaka Obi", "teacher");
    backend.add_user("bisi@school.test", "library-card", 3, "Bisi Ade", "librarian");
    backend.add_user("femi@school.test", "assembly-hall", 4, "Femi Ola", "primary_admin");
    backend
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_teacher_login_lands_on_teacher_dashboard() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStore::new());
    let portal = backend.portal(storage.clone()).unwrap();

    let outcome = portal
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "chalk-and-board"))
        .await
        .unwrap();

    assert_eq!(outcome.user.role, UserRole::Teacher);
    assert_eq!(outcome.destination, "/teacher/dashboard");
    assert_eq!(portal.auth().gate(), GateView::Protected(outcome.user));
    assert!(portal.auth().session().is_authenticated);
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_some());
    assert!(storage.get(keys::CURRENT_USER).unwrap().is_some());
}

#[tokio::test]
async fn test_unknown_role_lands_on_default_destination() {
    let backend = backend().await;
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();

    let outcome = portal
        .auth()
        .login(&LoginCredentials::new("bisi@school.test", "library-card"))
        .await
        .unwrap();

    assert_eq!(outcome.user.role, UserRole::Other("librarian".to_string()));
    assert_eq!(outcome.destination, "/");
    assert!(portal.auth().session().is_authenticated);
}

#[tokio::test]
async fn test_section_admin_destination() {
    let backend = backend().await;
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();

    let outcome = portal
        .auth()
        .login(&LoginCredentials::new("femi@school.test", "assembly-hall"))
        .await
        .unwrap();

    assert_eq!(outcome.user.role, UserRole::SectionAdmin(Section::Primary));
    assert_eq!(outcome.destination, "/section-admin/primary/dashboard");
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStore::new());
    let portal = backend.portal(storage.clone()).unwrap();

    let error = portal
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "wrong"))
        .await
        .unwrap_err();

    assert!(
        matches!(error, LoginError::InvalidCredentials(ref m) if m == "Invalid email or password")
    );
    assert!(!portal.auth().signal().is_auth_lost());
    assert!(portal.auth().session().user.is_none());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_blank_form_returns_field_errors() {
    let backend = backend().await;
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();

    let error = portal
        .auth()
        .login(&LoginCredentials::new("  ", ""))
        .await
        .unwrap_err();

    let LoginError::Validation { message, fields } = error else {
        panic!("expected validation error, got {error:?}");
    };
    assert_eq!(message, "Invalid input");
    assert_eq!(fields["identifier"], vec!["is required".to_string()]);
    assert_eq!(fields["password"], vec!["is required".to_string()]);
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let backend = backend().await;
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();
    drop(backend);

    let error = portal
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "chalk-and-board"))
        .await
        .unwrap_err();

    assert!(matches!(error, LoginError::Network(_)), "got {error:?}");
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_revokes_and_is_idempotent() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStore::new());
    let portal = backend.portal(storage.clone()).unwrap();
    portal
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "chalk-and-board"))
        .await
        .unwrap();
    assert_eq!(backend.active_sessions(), 1);

    portal.auth().logout().await;
    portal.auth().logout().await;

    assert_eq!(backend.logout_calls(), 1);
    assert_eq!(backend.active_sessions(), 0);
    assert!(storage.is_empty());
    assert_eq!(portal.auth().gate(), GateView::Unauthenticated);
}

// =============================================================================
// Restore
// =============================================================================

#[tokio::test]
async fn test_restore_keeps_valid_session() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStore::new());
    backend
        .portal(storage.clone())
        .unwrap()
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "chalk-and-board"))
        .await
        .unwrap();

    let reloaded = backend.portal(storage).unwrap();
    assert_eq!(reloaded.auth().gate(), GateView::Loading);

    let session = reloaded.start().await;
    assert!(session.is_authenticated);
    assert!(!session.is_loading);
    assert_eq!(session.user.unwrap().name, "Amaka Obi");
}

#[tokio::test]
async fn test_restore_drops_expired_session() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStore::new());
    backend
        .portal(storage.clone())
        .unwrap()
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "chalk-and-board"))
        .await
        .unwrap();
    backend.expire_sessions();

    let reloaded = backend.portal(storage.clone()).unwrap();
    let session = reloaded.auth().restore().await;

    assert!(!session.is_authenticated);
    assert!(!reloaded.auth().signal().is_auth_lost());
    assert_eq!(reloaded.auth().gate(), GateView::Unauthenticated);
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_none());
}

#[tokio::test]
async fn test_restore_offline_keeps_cached_user() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStore::new());
    backend
        .portal(storage.clone())
        .unwrap()
        .auth()
        .login(&LoginCredentials::new("amaka@school.test", "chalk-and-board"))
        .await
        .unwrap();

    let reloaded = backend.portal(storage).unwrap();
    drop(backend);

    let session = reloaded.auth().restore().await;
    assert!(session.is_authenticated);
    assert_eq!(session.user.unwrap().role, UserRole::Teacher);
}
