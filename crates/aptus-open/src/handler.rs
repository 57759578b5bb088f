//! Request handlers: door-name resolution and the HTTP routes.

use std::sync::Arc;

use aptus_protocol::DoorLookup;
use aptus_session::{SessionError, SessionManager};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

/// What happened to a request to unlock a door by name.
#[derive(Debug)]
pub enum UnlockOutcome {
    /// The portal accepted the unlock.
    Success,
    /// No configured door has this name.
    NotFound,
    /// Several doors share this name; none was tried.
    Ambiguous,
    /// The door was found but the unlock failed. Usually an
    /// authentication failure; `SessionError::NotLive` once shut down.
    Failed(SessionError),
}

impl UnlockOutcome {
    /// Status code and plain-text body the front end answers with.
    pub fn response(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Success => (StatusCode::OK, "success"),
            Self::NotFound => (StatusCode::NOT_FOUND, "no such door"),
            Self::Ambiguous => (StatusCode::INTERNAL_SERVER_ERROR, "many doors matching id"),
            Self::Failed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "fail"),
        }
    }
}

/// Looks `name` up in the manager's secrets and, if exactly one door
/// matches, unlocks it.
pub async fn unlock_by_name(manager: &SessionManager, name: &str) -> UnlockOutcome {
    let door = match manager.secrets().lookup(name) {
        DoorLookup::Found(door) => door,
        DoorLookup::NotFound => {
            tracing::error!(door = name, "request for unknown door");
            return UnlockOutcome::NotFound;
        }
        DoorLookup::Ambiguous(doors) => {
            tracing::error!(door = name, matches = doors.len(), "several doors match");
            return UnlockOutcome::Ambiguous;
        }
    };

    tracing::info!(%door, "opening");
    match manager.unlock(door).await {
        Ok(()) => UnlockOutcome::Success,
        Err(e) => {
            tracing::error!(%door, error = %e, "failed to open door");
            UnlockOutcome::Failed(e)
        }
    }
}

/// The front end's routes, bound to `manager`.
pub fn router(manager: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/unlock-door/:door", post(unlock_door))
        .route("/health", get(health))
        .with_state(manager)
}

async fn unlock_door(
    State(manager): State<Arc<SessionManager>>,
    Path(door): Path<String>,
) -> (StatusCode, &'static str) {
    unlock_by_name(&manager, &door).await.response()
}

async fn health() -> &'static str {
    "ok"
}
