//! The session manager: one live portal session, kept fresh in the
//! background and shared with every unlock request.
//!
//! # Concurrency
//!
//! The current session sits behind a single `tokio::sync::Mutex`. Two kinds
//! of work take it:
//!
//! - `unlock` holds it for the duration of one unlock request, so the
//!   context it uses cannot be swapped out or released mid-request.
//! - `refresh` logs in on a scratch context *without* the lock, then takes
//!   it only long enough to swap the new context in. The old context is
//!   released after the lock is dropped.
//!
//! The mutex is FIFO fair, so swaps and unlocks are totally ordered: an
//! unlock sees either the session from before a refresh or the one from
//! after it, and never waits on a refresh's network calls.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aptus_protocol::{Door, Endpoints, Secrets};
use aptus_tick::{PeriodicTask, TickConfig, TickInfo};
use aptus_transport::{ClientContext, ContextFactory, ContextId};
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument, Span};

use crate::{authenticate, unlock_door, ManagerState, SessionConfig, SessionError};

/// Lifecycle bookkeeping. Owns the refresh task while live.
enum Lifecycle {
    Created,
    Live(PeriodicTask),
    Failed,
    ShutDown,
}

impl Lifecycle {
    fn state(&self) -> ManagerState {
        match self {
            Self::Created => ManagerState::Created,
            Self::Live(_) => ManagerState::Live,
            Self::Failed => ManagerState::Failed,
            Self::ShutDown => ManagerState::ShutDown,
        }
    }
}

/// The part of the manager the refresh task shares.
struct Shared {
    secrets: Arc<Secrets>,
    endpoints: Endpoints,
    factory: ContextFactory,
    current: Mutex<Option<ClientContext>>,
    /// Set once `initialize` stores a session, cleared when shutdown
    /// begins. Lets `refresh` bail out without queueing on `current`.
    live: AtomicBool,
    span: Span,
}

impl Shared {
    /// Builds a fresh context and runs the login flow on it. The context
    /// is dropped, and so released, on every error path.
    async fn login(&self) -> Result<ClientContext, SessionError> {
        let ctx = self.factory.create()?;
        authenticate(&ctx, &self.endpoints, &self.secrets.credentials).await?;
        Ok(ctx)
    }

    async fn refresh(&self) -> Result<ContextId, SessionError> {
        if !self.live.load(Ordering::Acquire) {
            return Err(SessionError::NotLive);
        }

        let fresh = self.login().await?;
        let id = fresh.id();

        let old = {
            let mut current = self.current.lock().await;
            if current.is_none() {
                // Shut down while we were logging in.
                return Err(SessionError::NotLive);
            }
            mem::replace(&mut *current, Some(fresh))
        };

        if let Some(old) = old {
            old.close();
        }
        Ok(id)
    }
}

/// Spawns the background loop that calls `refresh` once per tick.
///
/// A failed cycle is logged and the previous session stays in place; the
/// loop only ends when the returned task is shut down or dropped.
fn refresh_forever(shared: Arc<Shared>, config: TickConfig) -> PeriodicTask {
    let span = shared.span.clone();
    span.in_scope(|| {
        PeriodicTask::spawn(config, move |tick: TickInfo| {
            let shared = Arc::clone(&shared);
            async move {
                match shared.refresh().await {
                    Ok(context) => {
                        info!(tick = tick.tick, %context, "session refreshed");
                    }
                    Err(e) => {
                        warn!(tick = tick.tick, error = %e, "session refresh failed, keeping previous session");
                    }
                }
            }
        })
    })
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Owns the current portal session and the task that refreshes it.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ initialize() ──→ [Live] ──→ unlock() / refresh() ... ──→ shutdown()
///                 │
///                 └──(login failed)──→ [Failed]
/// ```
///
/// [`open`](Self::open) is `new` + `initialize` in one call. Dropping a
/// live manager without `shutdown` aborts the refresh task and releases
/// the session.
pub struct SessionManager {
    shared: Arc<Shared>,
    refresh: TickConfig,
    lifecycle: Mutex<Lifecycle>,
}

impl SessionManager {
    pub fn builder(secrets: impl Into<Arc<Secrets>>) -> SessionManagerBuilder {
        SessionManagerBuilder::new(secrets)
    }

    /// A manager in the `Created` state. Nothing is sent until
    /// [`initialize`](Self::initialize).
    pub fn new(secrets: impl Into<Arc<Secrets>>, config: SessionConfig) -> Self {
        Self::builder(secrets).config(config).build()
    }

    /// Creates and initializes a manager.
    ///
    /// # Errors
    /// Whatever [`initialize`](Self::initialize) returns.
    pub async fn open(
        secrets: impl Into<Arc<Secrets>>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        Self::builder(secrets).config(config).open().await
    }

    /// Logs in and starts the refresh loop.
    ///
    /// # Errors
    /// - [`SessionError::Authentication`] / [`SessionError::Transport`]:
    ///   the first login failed. The manager moves to `Failed` for good.
    /// - [`SessionError::AlreadyInitialized`]: the manager is live.
    /// - [`SessionError::Closed`]: the manager failed earlier or was shut
    ///   down.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let shared = &self.shared;
        async {
            let mut lifecycle = self.lifecycle.lock().await;
            match *lifecycle {
                Lifecycle::Created => {}
                Lifecycle::Live(_) => return Err(SessionError::AlreadyInitialized),
                Lifecycle::Failed | Lifecycle::ShutDown => return Err(SessionError::Closed),
            }

            let ctx = match shared.login().await {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(error = %e, "initial login failed");
                    *lifecycle = Lifecycle::Failed;
                    return Err(e);
                }
            };
            let context = ctx.id();
            *shared.current.lock().await = Some(ctx);
            shared.live.store(true, Ordering::Release);

            let task = refresh_forever(Arc::clone(shared), self.refresh.clone());
            *lifecycle = Lifecycle::Live(task);
            info!(%context, interval = ?self.refresh.interval, "session live");
            Ok(())
        }
        .instrument(shared.span.clone())
        .await
    }

    /// Replaces the current session with a freshly logged-in one.
    ///
    /// The refresh loop calls this on its own; calling it directly is
    /// useful when a caller knows the session went stale.
    ///
    /// # Errors
    /// - [`SessionError::NotLive`]: not initialized, or shut down while
    ///   the login ran. No context is leaked in either case.
    /// - [`SessionError::Authentication`] / [`SessionError::Transport`]:
    ///   the login failed. The current session is untouched.
    pub async fn refresh(&self) -> Result<ContextId, SessionError> {
        self.shared
            .refresh()
            .instrument(self.shared.span.clone())
            .await
    }

    /// Unlocks `door` with the current session.
    ///
    /// # Errors
    /// - [`SessionError::NotLive`]: there is no current session.
    /// - [`SessionError::Authentication`] with
    ///   [`AuthFailure::Unlock`](crate::AuthFailure::Unlock): the portal
    ///   answered anything but `200 OK`.
    pub async fn unlock(&self, door: &Door) -> Result<(), SessionError> {
        let shared = &self.shared;
        async {
            let current = shared.current.lock().await;
            let ctx = current.as_ref().ok_or(SessionError::NotLive)?;
            match unlock_door(ctx, &shared.endpoints, door).await {
                Ok(()) => {
                    info!(%door, context = %ctx.id(), "door unlocked");
                    Ok(())
                }
                Err(e) => {
                    warn!(%door, context = %ctx.id(), error = %e, "unlock failed");
                    Err(e.into())
                }
            }
        }
        .instrument(shared.span.clone())
        .await
    }

    /// Stops the refresh loop, waits for it to exit, then releases the
    /// current session.
    ///
    /// Idempotent. A refresh in flight is cancelled and its scratch
    /// context released; an unlock in flight finishes first, since the
    /// release waits for the session lock.
    pub async fn shutdown(&self) {
        let shared = &self.shared;
        async {
            let mut lifecycle = self.lifecycle.lock().await;
            let previous = mem::replace(&mut *lifecycle, Lifecycle::ShutDown);
            shared.live.store(false, Ordering::Release);
            match previous {
                Lifecycle::ShutDown => return,
                Lifecycle::Live(mut task) => task.shutdown().await,
                Lifecycle::Created | Lifecycle::Failed => {}
            }

            let released = shared.current.lock().await.take();
            if let Some(ctx) = released {
                ctx.close();
            }
            info!("session manager shut down");
        }
        .instrument(shared.span.clone())
        .await
    }

    /// Id of the context currently in use, if any.
    pub async fn current_context_id(&self) -> Option<ContextId> {
        self.shared.current.lock().await.as_ref().map(ClientContext::id)
    }

    /// Whether there is a current session.
    pub async fn is_live(&self) -> bool {
        self.shared.current.lock().await.is_some()
    }

    pub async fn state(&self) -> ManagerState {
        self.lifecycle.lock().await.state()
    }

    pub fn secrets(&self) -> &Secrets {
        &self.shared.secrets
    }

    /// Client contexts built by this manager and not yet released: 1 while
    /// live (2 during a refresh), 0 once shut down.
    pub fn live_contexts(&self) -> usize {
        self.shared.factory.live_contexts()
    }
}

// ---------------------------------------------------------------------------
// SessionManagerBuilder
// ---------------------------------------------------------------------------

/// Configures a [`SessionManager`].
///
/// ```ignore
/// let manager = SessionManager::builder(secrets)
///     .config(config)
///     .span(tracing::info_span!("session", user = %username))
///     .open()
///     .await?;
/// ```
pub struct SessionManagerBuilder {
    secrets: Arc<Secrets>,
    config: SessionConfig,
    span: Option<Span>,
}

impl SessionManagerBuilder {
    pub fn new(secrets: impl Into<Arc<Secrets>>) -> Self {
        Self {
            secrets: secrets.into(),
            config: SessionConfig::default(),
            span: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The span every log event of the manager is recorded in, including
    /// those of its refresh task. Defaults to `session_manager`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> SessionManager {
        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("session_manager"));
        let SessionConfig {
            refresh,
            transport,
            endpoints,
        } = self.config;

        SessionManager {
            shared: Arc::new(Shared {
                secrets: self.secrets,
                endpoints,
                factory: ContextFactory::new(transport),
                current: Mutex::new(None),
                live: AtomicBool::new(false),
                span,
            }),
            refresh: refresh.validated(),
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    /// Builds and initializes the manager.
    pub async fn open(self) -> Result<SessionManager, SessionError> {
        let manager = self.build();
        manager.initialize().await?;
        Ok(manager)
    }
}
