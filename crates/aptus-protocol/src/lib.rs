//! Wire-level knowledge of the property portal.
//!
//! This crate defines everything the rest of the workspace needs to know
//! about the portal without performing any I/O:
//!
//! - **Types** ([`Door`], [`Credentials`], [`Secrets`]): the immutable
//!   records loaded from the secrets file.
//! - **Endpoints** ([`Endpoints`]): the exact URLs of the four calls the
//!   login and unlock sequence makes.
//! - **Codec** ([`WidgetEnvelope`]): unwrapping the JSONP-style widget
//!   response and resolving the secondary login URL inside it.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! Session (auth flow, door actuator) → Protocol (URLs, envelope) → Transport (HTTP)
//! ```

mod codec;
mod endpoints;
mod error;
mod types;

pub use codec::WidgetEnvelope;
pub use endpoints::{
    Endpoints, CALLBACK_LEN, DEFAULT_LOCK_URL, DEFAULT_PORTAL_URL,
    SENTINEL_COOKIE, WIDGET_NAME,
};
pub use error::ProtocolError;
pub use types::{Credentials, Door, DoorLookup, Secrets};
