//! `AptusServer` builder and serve loop.
//!
//! Ties the HTTP front end to a live [`SessionManager`] and owns the
//! shutdown order: stop accepting requests, let in-flight ones finish,
//! then shut the manager down.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use aptus_session::SessionManager;
use tokio::net::TcpListener;

use crate::handler::router;
use crate::AptusError;

/// Builder for the HTTP front end.
///
/// # Example
///
/// ```rust,ignore
/// let server = AptusServer::builder()
///     .bind("127.0.0.1:2138")
///     .build(Arc::new(manager))
///     .await?;
/// server.run().await
/// ```
pub struct AptusServerBuilder {
    bind_addr: String,
}

impl AptusServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:2138".to_string(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener. The manager should already be initialized.
    pub async fn build(self, manager: Arc<SessionManager>) -> Result<AptusServer, AptusError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        Ok(AptusServer { listener, manager })
    }
}

impl Default for AptusServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound front end, not yet serving.
pub struct AptusServer {
    listener: TcpListener,
    manager: Arc<SessionManager>,
}

impl AptusServer {
    pub fn builder() -> AptusServerBuilder {
        AptusServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> Result<(), AptusError> {
        self.run_until(ctrl_c()).await
    }

    /// Serves until `shutdown` resolves, drains in-flight requests, then
    /// shuts the session manager down.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), AptusError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.manager));
        tracing::info!(addr = ?self.listener.local_addr().ok(), "listening");

        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        // Release the session even when serving failed.
        self.manager.shutdown().await;
        served?;
        tracing::info!("front end stopped");
        Ok(())
    }
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("ctrl-c received, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
