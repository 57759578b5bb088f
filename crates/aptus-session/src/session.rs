//! Manager configuration and the lifecycle states it moves through.

use aptus_protocol::Endpoints;
use aptus_tick::TickConfig;
use aptus_transport::TransportConfig;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Everything a [`SessionManager`](crate::SessionManager) needs besides the
/// secrets.
///
/// `SessionConfig::default()` talks to the production portal, refreshes
/// every four minutes and uses the transport's default timeouts. Override
/// only the fields you care about:
///
/// ```ignore
/// let config = SessionConfig {
///     refresh: TickConfig::every(Duration::from_secs(60)),
///     ..SessionConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Cadence of the background refresh loop.
    pub refresh: TickConfig,
    /// Timeouts and user agent for every client context.
    pub transport: TransportConfig,
    /// Portal and lock-portal origins.
    pub endpoints: Endpoints,
}

// ---------------------------------------------------------------------------
// ManagerState
// ---------------------------------------------------------------------------

/// Where a manager is in its one-shot lifecycle.
///
/// ```text
///   Created ──(initialize ok)──→ Live ──(shutdown)──→ ShutDown
///      │
///      └──(initialize err)──→ Failed ──(shutdown)──→ ShutDown
/// ```
///
/// There is no way back to `Created`; a failed or shut-down manager is
/// replaced, not revived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Created,
    Live,
    Failed,
    ShutDown,
}
