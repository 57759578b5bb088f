//! # aptus-open
//!
//! Unlocks apartment entry doors through the aptus tenant portal, over a
//! small local HTTP API.
//!
//! The layers below do the work:
//!
//! - `aptus-protocol`: endpoints, door records, the widget envelope codec
//! - `aptus-transport`: HTTP clients with private cookie jars
//! - `aptus-tick`: the fixed-interval refresh loop
//! - `aptus-session`: the login flow and the session manager
//!
//! This crate adds the secrets file ([`Config`]), the HTTP front end
//! ([`AptusServer`]) and the `aptus-open` binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use aptus_open::prelude::*;
//!
//! # async fn demo() -> Result<(), AptusError> {
//! let config = Config::load("secrets.toml")?;
//! let manager = SessionManager::open(config.secrets.clone(), config.session_config()?).await?;
//! let server = AptusServer::builder()
//!     .bind(&config.server.addr())
//!     .build(Arc::new(manager))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{Config, ConfigError, PortalConfig, RefreshConfig, ServerConfig};
pub use error::AptusError;
pub use handler::{router, unlock_by_name, UnlockOutcome};
pub use server::{AptusServer, AptusServerBuilder};

pub mod prelude {
    pub use crate::{AptusError, AptusServer, Config, UnlockOutcome};
    pub use aptus_protocol::{Credentials, Door, Secrets};
    pub use aptus_session::{AuthFailure, SessionConfig, SessionError, SessionManager};
}
