//! Error types for the session layer.

use std::fmt;

use aptus_transport::TransportError;

/// Where in the login or unlock sequence a failure happened.
///
/// Closed on purpose: callers can match exhaustively, and tests can
/// assert the exact failure site rather than a free-form message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// The sentinel cookie was missing after `POST /wp-login.php`.
    PrimaryLogin,
    /// `/widgets/` answered non-200, or the login URL could not be
    /// extracted from its payload.
    WidgetResolution,
    /// The secondary login URL answered non-200.
    SecondaryLogin,
    /// `UnlockEntryDoor` answered non-200.
    Unlock,
}

impl AuthFailure {
    /// Stable kebab-case identifier, for logs and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryLogin => "primary-login-failed",
            Self::WidgetResolution => "widget-resolution-failed",
            Self::SecondaryLogin => "secondary-login-failed",
            Self::Unlock => "unlock-failed",
        }
    }

    /// The step that failed, named after the portal endpoint.
    pub fn reason(self) -> &'static str {
        match self {
            Self::PrimaryLogin => "wp-login.php failed",
            Self::WidgetResolution => "aptus login url @ /widgets/",
            Self::SecondaryLogin => "aptus login url",
            Self::Unlock => "/UnlockEntryDoor/",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step of the portal sequence failed.
///
/// Carries the failure site and, when available, a diagnostic such as the
/// HTTP status received or the underlying transport error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication failed: {kind} ({}){}", .kind.reason(), detail_suffix(.detail))]
pub struct AuthenticationError {
    kind: AuthFailure,
    detail: Option<String>,
}

impl AuthenticationError {
    pub fn new(kind: AuthFailure) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: AuthFailure, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// Wraps a transport failure as a failure of the step it happened in.
    pub(crate) fn transport(kind: AuthFailure, err: TransportError) -> Self {
        Self::with_detail(kind, err.to_string())
    }

    pub fn kind(&self) -> AuthFailure {
        self.kind
    }

    pub fn reason(&self) -> &'static str {
        self.kind.reason()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Errors returned by [`SessionManager`](crate::SessionManager).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A step of the login or unlock sequence failed.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// A fresh client context could not be built.
    #[error("client context unavailable: {0}")]
    Transport(#[from] TransportError),

    /// The manager has no current session: it was never initialized,
    /// its initialization failed, or it has been shut down.
    #[error("session manager is not live")]
    NotLive,

    /// `initialize` was called on a manager that is already live.
    #[error("session manager already initialized")]
    AlreadyInitialized,

    /// `initialize` was called after a failed initialization or after
    /// shutdown. The lifecycle is one-shot; build a new manager.
    #[error("session manager is closed")]
    Closed,
}

impl SessionError {
    /// The authentication failure site, if this is an authentication error.
    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            Self::Authentication(e) => Some(e.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_names_every_failure_site() {
        assert_eq!(AuthFailure::PrimaryLogin.as_str(), "primary-login-failed");
        assert_eq!(AuthFailure::WidgetResolution.as_str(), "widget-resolution-failed");
        assert_eq!(AuthFailure::SecondaryLogin.as_str(), "secondary-login-failed");
        assert_eq!(AuthFailure::Unlock.as_str(), "unlock-failed");
    }

    #[test]
    fn test_reason_matches_portal_endpoint() {
        assert_eq!(AuthFailure::PrimaryLogin.reason(), "wp-login.php failed");
        assert_eq!(AuthFailure::WidgetResolution.reason(), "aptus login url @ /widgets/");
        assert_eq!(AuthFailure::SecondaryLogin.reason(), "aptus login url");
        assert_eq!(AuthFailure::Unlock.reason(), "/UnlockEntryDoor/");
    }

    #[test]
    fn test_display_without_detail() {
        let e = AuthenticationError::new(AuthFailure::Unlock);
        assert_eq!(
            e.to_string(),
            "authentication failed: unlock-failed (/UnlockEntryDoor/)"
        );
        assert_eq!(e.detail(), None);
    }

    #[test]
    fn test_display_with_detail() {
        let e = AuthenticationError::with_detail(AuthFailure::SecondaryLogin, "status 502");
        assert!(e.to_string().ends_with("(aptus login url): status 502"));
        assert_eq!(e.detail(), Some("status 502"));
    }

    #[test]
    fn test_session_error_forwards_authentication_display() {
        let auth = AuthenticationError::with_detail(AuthFailure::PrimaryLogin, "cookie missing");
        let expected = "authentication failed: primary-login-failed (wp-login.php failed): cookie missing";
        assert_eq!(auth.to_string(), expected);

        let e: SessionError = auth.into();
        assert_eq!(e.to_string(), expected);
        let as_error: &dyn std::error::Error = &e;
        assert!(as_error.source().is_none());
    }

    #[test]
    fn test_session_error_auth_failure() {
        let e: SessionError = AuthenticationError::new(AuthFailure::PrimaryLogin).into();
        assert_eq!(e.auth_failure(), Some(AuthFailure::PrimaryLogin));
        assert_eq!(SessionError::NotLive.auth_failure(), None);
    }
}
