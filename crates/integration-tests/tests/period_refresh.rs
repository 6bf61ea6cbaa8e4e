//! Integration tests for best-effort period polling.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{sleep, timeout};

use schoolhouse_client::api::auth::LoginCredentials;
use schoolhouse_client::storage::MemoryStore;
use schoolhouse_core::CurrentPeriod;
use schoolhouse_integration_tests::{HttpStatus, MockBackend, PeriodReply};

const WAIT: Duration = Duration::from_secs(3);

fn mathematics() -> PeriodReply {
    PeriodReply::Running(json!({
        "id": 12,
        "subject": "Mathematics",
        "class_name": "JSS 2A",
        "starts_at": "09:00:00",
        "ends_at": "09:40:00",
        "teacher": "Mrs. Okafor",
    }))
}

/// Wait for the next published value.
async fn next_value(
    rx: &mut tokio::sync::watch::Receiver<Option<CurrentPeriod>>,
) -> Option<CurrentPeriod> {
    timeout(WAIT, rx.changed()).await.unwrap().unwrap();
    rx.borrow_and_update().clone()
}

/// Wait until the backend has seen at least `calls` period requests.
async fn wait_for_calls(backend: &MockBackend, calls: usize) {
    timeout(WAIT, async {
        while backend.period_calls() < calls {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test]
async fn test_publishes_running_period() {
    let backend = MockBackend::start().await;
    backend.set_period(mathematics());
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();

    let refresher = portal.refresh_period();
    let mut rx = refresher.watch();

    let period = next_value(&mut rx).await.unwrap();
    assert_eq!(period.subject, "Mathematics");
    assert_eq!(period.teacher.as_deref(), Some("Mrs. Okafor"));
    assert_eq!(refresher.latest(), Some(period));
}

#[tokio::test]
async fn test_idle_clears_period() {
    let backend = MockBackend::start().await;
    backend.set_period(mathematics());
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();
    let refresher = portal.refresh_period();
    let mut rx = refresher.watch();
    assert!(next_value(&mut rx).await.is_some());

    backend.set_period(PeriodReply::Idle);

    assert!(next_value(&mut rx).await.is_none());
    assert!(refresher.latest().is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_server_errors_keep_last_value_and_keep_polling() {
    let backend = MockBackend::start().await;
    backend.set_period(mathematics());
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();
    let refresher = portal.refresh_period();
    let mut rx = refresher.watch();
    assert!(next_value(&mut rx).await.is_some());

    backend.set_period(PeriodReply::Fail(HttpStatus::INTERNAL_SERVER_ERROR));
    let calls = backend.period_calls();
    wait_for_calls(&backend, calls + 3).await;

    assert_eq!(refresher.latest().unwrap().subject, "Mathematics");
    assert!(!rx.has_changed().unwrap());
    assert!(!portal.auth().signal().is_auth_lost());

    // Recovery picks up the new value.
    backend.set_period(PeriodReply::Idle);
    assert!(next_value(&mut rx).await.is_none());
}

#[tokio::test]
async fn test_expired_session_while_polling_stays_silent() {
    let backend = MockBackend::start().await;
    backend.add_user("ngozi@school.test", "blue-biro", 21, "Ngozi Eze", "student");
    backend.set_period(mathematics());
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();
    portal
        .auth()
        .login(&LoginCredentials::new("ngozi@school.test", "blue-biro"))
        .await
        .unwrap();

    let refresher = portal.refresh_period();
    let mut rx = refresher.watch();
    assert!(next_value(&mut rx).await.is_some());

    backend.expire_sessions();
    let calls = backend.period_calls();
    wait_for_calls(&backend, calls + 3).await;

    assert!(refresher.latest().is_some());
    assert!(!portal.auth().signal().is_auth_lost());
    assert!(portal.auth().session().is_authenticated);
}

#[tokio::test]
async fn test_dropping_refresher_stops_polling() {
    let backend = MockBackend::start().await;
    let portal = backend.portal(Arc::new(MemoryStore::new())).unwrap();
    let refresher = portal.refresh_period();
    wait_for_calls(&backend, 2).await;

    drop(refresher);
    sleep(Duration::from_millis(100)).await;
    let settled = backend.period_calls();
    sleep(Duration::from_millis(250)).await;

    assert_eq!(backend.period_calls(), settled);
}
