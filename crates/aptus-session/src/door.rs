//! The door actuator: one request, one door.

use aptus_protocol::{Door, Endpoints};
use aptus_transport::{ClientContext, StatusCode};

use crate::{AuthFailure, AuthenticationError};

/// Asks the lock portal to unlock `door` using the cookies in `ctx`.
///
/// Single attempt, no retries. Anything but `200 OK` is
/// [`AuthFailure::Unlock`]: the portal answers an expired session with an
/// error status rather than a login page, so this is also how a stale
/// session shows up.
pub async fn unlock_door(
    ctx: &ClientContext,
    endpoints: &Endpoints,
    door: &Door,
) -> Result<(), AuthenticationError> {
    let resp = ctx
        .get(endpoints.unlock(&door.id))
        .await
        .map_err(|e| AuthenticationError::transport(AuthFailure::Unlock, e))?;

    let status = resp.status();
    tracing::debug!(%door, context = %ctx.id(), %status, "unlock request answered");

    if status != StatusCode::OK {
        return Err(AuthenticationError::with_detail(
            AuthFailure::Unlock,
            format!("status {status}"),
        ));
    }
    Ok(())
}
