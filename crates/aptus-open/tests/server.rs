//! Integration tests for the HTTP front end against a fake portal.

mod support;

use std::net::SocketAddr;
use std::sync::Arc;

use aptus_open::prelude::*;
use aptus_open::unlock_by_name;
use aptus_session::ManagerState;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    manager: Arc<SessionManager>,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), AptusError>>,
    _portal: wiremock::MockServer,
}

async fn start() -> Running {
    let portal = support::portal().await;
    let manager = Arc::new(
        SessionManager::open(support::secrets(), support::config(&portal))
            .await
            .unwrap(),
    );
    let server = AptusServer::builder()
        .bind("127.0.0.1:0")
        .build(Arc::clone(&manager))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async {
        let _ = stopped.await;
    }));

    Running {
        addr,
        manager,
        stop,
        handle,
        _portal: portal,
    }
}

async fn post(addr: SocketAddr, door: &str) -> (u16, String) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/unlock-door/{door}"))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

// =========================================================================
// Status mapping
// =========================================================================

#[tokio::test]
async fn test_unlock_known_door_is_success() {
    let running = start().await;
    assert_eq!(post(running.addr, "front-door").await, (200, "success".to_string()));
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unlock_unknown_door_is_not_found() {
    let running = start().await;
    assert_eq!(post(running.addr, "attic").await, (404, "no such door".to_string()));
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unlock_duplicate_name_is_refused() {
    let running = start().await;
    assert_eq!(
        post(running.addr, "laundry").await,
        (500, "many doors matching id".to_string())
    );
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unlock_rejected_by_portal_is_fail() {
    let running = start().await;
    assert_eq!(post(running.addr, "garage").await, (500, "fail".to_string()));

    // The service keeps answering after a failure.
    assert_eq!(post(running.addr, "front-door").await.0, 200);
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_health_answers_ok() {
    let running = start().await;
    let body = reqwest::get(format!("http://{}/health", running.addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unlock_requires_post() {
    let running = start().await;
    let resp = reqwest::get(format!("http://{}/unlock-door/front-door", running.addr))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 405);
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_graceful_shutdown_shuts_manager_down() {
    let running = start().await;
    assert_eq!(running.manager.state().await, ManagerState::Live);

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();

    assert_eq!(running.manager.state().await, ManagerState::ShutDown);
    assert_eq!(running.manager.live_contexts(), 0);
}

// =========================================================================
// unlock_by_name
// =========================================================================

#[tokio::test]
async fn test_unlock_by_name_outcomes() {
    let portal = support::portal().await;
    let manager = SessionManager::open(support::secrets(), support::config(&portal))
        .await
        .unwrap();

    assert!(matches!(
        unlock_by_name(&manager, "front-door").await,
        UnlockOutcome::Success
    ));
    assert!(matches!(
        unlock_by_name(&manager, "attic").await,
        UnlockOutcome::NotFound
    ));
    assert!(matches!(
        unlock_by_name(&manager, "laundry").await,
        UnlockOutcome::Ambiguous
    ));
    match unlock_by_name(&manager, "garage").await {
        UnlockOutcome::Failed(e) => assert_eq!(e.auth_failure(), Some(AuthFailure::Unlock)),
        other => panic!("expected Failed, got {other:?}"),
    }

    manager.shutdown().await;
    assert!(matches!(
        unlock_by_name(&manager, "front-door").await,
        UnlockOutcome::Failed(SessionError::NotLive)
    ));
}
