//! Unified error type for the aptus-open service.

use aptus_session::SessionError;

use crate::ConfigError;

/// Top-level error that wraps the crate-specific errors.
///
/// The binary deals with this single type; `#[from]` on each variant lets
/// `?` convert the lower layers' errors.
#[derive(Debug, thiserror::Error)]
pub enum AptusError {
    /// The secrets file could not be read or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The first login failed, or the manager was misused.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Binding or serving the HTTP front end failed.
    #[error("http front end: {0}")]
    Io(#[from] std::io::Error),
}
