//! Portal sessions for aptus-open.
//!
//! This crate owns everything that needs a logged-in portal session:
//!
//! 1. **Authentication**: the three-step login ([`AuthFlow`], [`authenticate`])
//! 2. **Session management**: one current session, refreshed in the
//!    background and swapped under a lock ([`SessionManager`])
//! 3. **Door actuation**: the unlock request itself ([`unlock_door`])
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP front end (above)  ← resolves door names, calls SessionManager::unlock
//!     ↕
//! Session layer (this crate)  ← login flow, refresh loop, atomic swap
//!     ↕
//! Transport / protocol (below)  ← cookie-isolated clients, endpoints, widget codec
//! ```

mod auth;
mod door;
mod error;
mod manager;
mod session;

pub use auth::{authenticate, AuthFlow, AuthState};
pub use door::unlock_door;
pub use error::{AuthFailure, AuthenticationError, SessionError};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use session::{ManagerState, SessionConfig};
