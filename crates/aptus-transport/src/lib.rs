//! HTTP client contexts for talking to the portal.
//!
//! The portal's authentication lives entirely in cookies, so a logged-in
//! "session" is nothing more than an HTTP client with its own cookie jar.
//! This crate provides that client as a [`ClientContext`] and a
//! [`ContextFactory`] that builds fresh ones.
//!
//! # Release accounting
//!
//! Every context is released exactly once, when it is dropped. The
//! factory counts contexts that are still alive, which is how the session
//! layer's tests prove that failed refresh cycles do not leak scratch
//! contexts.
//!
//! # Timeouts
//!
//! Every request made through a context is bounded by the
//! [`TransportConfig`] timeouts, so a stalled portal cannot hang a
//! refresh cycle forever.

mod context;
mod error;

pub use context::{ClientContext, ContextFactory, ContextId, TransportConfig};
pub use error::TransportError;
pub use reqwest::{Response, StatusCode};
pub use url::Url;
