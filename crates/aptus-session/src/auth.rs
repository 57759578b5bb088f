//! The portal's three-step login, as a small state machine.
//!
//! ```text
//!   Unauthenticated ──(POST /wp-login.php, sentinel cookie set)──→ PrimaryLoginDone
//!   PrimaryLoginDone ──(GET /widgets/, aptusUrl extracted)──────→ WidgetResolved
//!   WidgetResolved ──(GET aptusUrl, 200)─────────────────────────→ Ready
//!
//!   any step ──(failure)──→ Failed(kind)
//! ```
//!
//! The flow only ever touches the cookie jar of the one [`ClientContext`]
//! it is given. Give it a fresh context every time; it never cleans up a
//! context it did not create.

use aptus_protocol::{
    Credentials, Endpoints, WidgetEnvelope, CALLBACK_LEN, SENTINEL_COOKIE,
};
use aptus_transport::{ClientContext, StatusCode, Url};
use rand::Rng;
use tracing::debug;

use crate::{AuthFailure, AuthenticationError};

/// Where the flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing sent yet.
    Unauthenticated,
    /// The portal accepted the credentials.
    PrimaryLoginDone,
    /// The secondary login URL is known.
    WidgetResolved { aptus_url: Url },
    /// All login cookies are set; the context can be used as a session.
    Ready,
    /// A step failed. Terminal.
    Failed(AuthFailure),
}

/// One run of the login sequence against one client context.
pub struct AuthFlow<'a> {
    ctx: &'a ClientContext,
    endpoints: &'a Endpoints,
    credentials: &'a Credentials,
    state: AuthState,
}

impl<'a> AuthFlow<'a> {
    pub fn new(
        ctx: &'a ClientContext,
        endpoints: &'a Endpoints,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            ctx,
            endpoints,
            credentials,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Drives the flow until it is `Ready` or has failed.
    pub async fn run(&mut self) -> Result<(), AuthenticationError> {
        while self.state != AuthState::Ready {
            self.step().await?;
        }
        Ok(())
    }

    /// Performs the next step. A failure moves the flow to `Failed` and
    /// every later call returns the same failure kind without sending
    /// anything.
    pub async fn step(&mut self) -> Result<(), AuthenticationError> {
        let result = match &self.state {
            AuthState::Unauthenticated => self
                .primary_login()
                .await
                .map(|()| AuthState::PrimaryLoginDone),
            AuthState::PrimaryLoginDone => self
                .resolve_widget()
                .await
                .map(|aptus_url| AuthState::WidgetResolved { aptus_url }),
            AuthState::WidgetResolved { aptus_url } => self
                .secondary_login(aptus_url.clone())
                .await
                .map(|()| AuthState::Ready),
            AuthState::Ready => return Ok(()),
            AuthState::Failed(kind) => {
                return Err(AuthenticationError::with_detail(
                    *kind,
                    "flow already failed",
                ));
            }
        };

        match result {
            Ok(next) => {
                debug!(context = %self.ctx.id(), state = ?next, "auth step done");
                self.state = next;
                Ok(())
            }
            Err(e) => {
                debug!(context = %self.ctx.id(), error = %e, "auth step failed");
                self.state = AuthState::Failed(e.kind());
                Err(e)
            }
        }
    }

    async fn primary_login(&self) -> Result<(), AuthenticationError> {
        let redirect = self.endpoints.redirect_target();
        let form = [
            ("log", self.credentials.username.as_str()),
            ("pwd", self.credentials.password.as_str()),
            ("redirect_to", redirect.as_str()),
        ];
        // The portal answers 200 even for bad credentials; only the
        // cookie tells success apart.
        self.ctx
            .post_form(self.endpoints.login(), &form)
            .await
            .map_err(|e| AuthenticationError::transport(AuthFailure::PrimaryLogin, e))?;

        if !self.ctx.has_cookie(SENTINEL_COOKIE) {
            return Err(AuthenticationError::with_detail(
                AuthFailure::PrimaryLogin,
                format!("cookie {SENTINEL_COOKIE} not set"),
            ));
        }
        Ok(())
    }

    async fn resolve_widget(&self) -> Result<Url, AuthenticationError> {
        let fail = |detail: String| {
            AuthenticationError::with_detail(AuthFailure::WidgetResolution, detail)
        };

        let callback = callback_name();
        let resp = self
            .ctx
            .get(self.endpoints.widgets(&callback))
            .await
            .map_err(|e| AuthenticationError::transport(AuthFailure::WidgetResolution, e))?;
        if resp.status() != StatusCode::OK {
            return Err(fail(format!("status {}", resp.status())));
        }

        let body = ClientContext::text(resp)
            .await
            .map_err(|e| AuthenticationError::transport(AuthFailure::WidgetResolution, e))?;
        let envelope = WidgetEnvelope::decode(&body).map_err(|e| fail(e.to_string()))?;
        let raw = envelope.aptus_url().map_err(|e| fail(e.to_string()))?;
        self.endpoints
            .secondary_login(raw)
            .map_err(|e| fail(e.to_string()))
    }

    async fn secondary_login(&self, aptus_url: Url) -> Result<(), AuthenticationError> {
        // This request is what sets the lock portal's login cookies.
        let resp = self
            .ctx
            .get(aptus_url)
            .await
            .map_err(|e| AuthenticationError::transport(AuthFailure::SecondaryLogin, e))?;
        if resp.status() != StatusCode::OK {
            return Err(AuthenticationError::with_detail(
                AuthFailure::SecondaryLogin,
                format!("status {}", resp.status()),
            ));
        }
        Ok(())
    }
}

/// Runs the whole flow against `ctx`.
pub async fn authenticate(
    ctx: &ClientContext,
    endpoints: &Endpoints,
    credentials: &Credentials,
) -> Result<(), AuthenticationError> {
    AuthFlow::new(ctx, endpoints, credentials).run().await
}

/// A random lowercase JSONP callback name. Its length fixes the widget
/// envelope's prefix length.
fn callback_name() -> String {
    let mut rng = rand::rng();
    (0..CALLBACK_LEN)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}
