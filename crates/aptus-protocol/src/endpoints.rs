//! The portal's URLs.
//!
//! The portal is split over two origins: the public site that handles
//! the primary login and widget lookup, and the lock portal that hosts
//! the unlock action. Both are configurable so tests can point them at
//! a local mock server.

use url::Url;

use crate::ProtocolError;

/// Public site of the portal.
pub const DEFAULT_PORTAL_URL: &str = "https://www.chalmersstudentbostader.se";

/// Origin of the lock portal that serves `UnlockEntryDoor`.
pub const DEFAULT_LOCK_URL: &str = "https://apt-www.chalmersstudentbostader.se";

/// Cookie whose presence after the primary login means it succeeded.
pub const SENTINEL_COOKIE: &str = "Fast2User_ssoId";

/// Widget that carries the secondary login URL.
pub const WIDGET_NAME: &str = "aptuslogin@APTUSPORT";

/// Length of the JSONP callback name. The widget envelope prefix is the
/// callback plus `(`, so this fixes the prefix at five characters.
pub const CALLBACK_LEN: usize = 4;

/// Resolved base URLs for every call the session layer makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    portal: Url,
    lock: Url,
}

impl Endpoints {
    /// Builds endpoints from two base URLs.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidUrl`] if either string does not parse or
    /// cannot carry a path (e.g. `mailto:`).
    pub fn new(portal: &str, lock: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            portal: parse_base(portal)?,
            lock: parse_base(lock)?,
        })
    }

    /// Base of the public site.
    pub fn portal(&self) -> &Url {
        &self.portal
    }

    /// Base of the lock portal.
    pub fn lock(&self) -> &Url {
        &self.lock
    }

    /// `POST` target of the primary login.
    pub fn login(&self) -> Url {
        with_path(&self.portal, "/wp-login.php")
    }

    /// Value of the login form's `redirect_to` field.
    pub fn redirect_target(&self) -> Url {
        with_path(&self.portal, "/mina-sidor/")
    }

    /// Widget lookup URL for the given JSONP callback name.
    pub fn widgets(&self, callback: &str) -> Url {
        let mut url = with_path(&self.portal, "/widgets/");
        url.query_pairs_mut()
            .append_pair("callback", callback)
            .append_pair("widgets[]", WIDGET_NAME);
        url
    }

    /// Resolves the `aptusUrl` found in the widget payload.
    ///
    /// The portal normally sends an absolute URL; a relative one is
    /// resolved against the public site.
    pub fn secondary_login(&self, aptus_url: &str) -> Result<Url, ProtocolError> {
        Ok(self.portal.join(aptus_url)?)
    }

    /// Unlock action for a door id. The id is percent-encoded as a single
    /// path segment.
    pub fn unlock(&self, door_id: &str) -> Url {
        let mut url = self.lock.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .clear()
                .extend(["AptusPortal", "Lock", "UnlockEntryDoor", door_id]);
        }
        url
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_PORTAL_URL, DEFAULT_LOCK_URL)
            .expect("default portal URLs are valid")
    }
}

fn parse_base(raw: &str) -> Result<Url, ProtocolError> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(ProtocolError::InvalidUrl(
            url::ParseError::RelativeUrlWithCannotBeABaseBase,
        ));
    }
    Ok(url)
}

fn with_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    url
}
