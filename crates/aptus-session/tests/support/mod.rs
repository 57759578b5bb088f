//! A fake portal on a local `wiremock` server.
//!
//! Serves both origins (public site and lock portal) from one server.
//! Every secondary login hands out a new `aptus_gen=<n>` cookie, so a test
//! can tell from an unlock request which login's session it used.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aptus_protocol::{Credentials, Door, Endpoints, Secrets, WidgetEnvelope};
use aptus_session::SessionConfig;
use aptus_tick::TickConfig;
use aptus_transport::TransportConfig;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const SECONDARY_LOGIN_PATH: &str = "/aptus/login";
pub const UNLOCK_PREFIX: &str = "/AptusPortal/Lock/UnlockEntryDoor/";

pub fn secrets() -> Secrets {
    Secrets::new(
        Credentials::new("tenant", "hunter2"),
        vec![Door::new("front-door", "123"), Door::new("laundry", "456")],
    )
}

pub fn front_door() -> Door {
    Door::new("front-door", "123")
}

// ---------------------------------------------------------------------------
// Responders
// ---------------------------------------------------------------------------

/// Answers `/widgets/` with the JSONP envelope the real portal sends,
/// wrapped in whatever callback name the client asked for.
pub struct WidgetResponder {
    aptus_url: String,
}

impl Respond for WidgetResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let callback = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "callback")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let json = serde_json::json!({
            "data": {
                "aptuslogin@APTUSPORT": {
                    "objekt": [{ "aptusUrl": self.aptus_url }]
                }
            }
        });
        ResponseTemplate::new(200).set_body_string(WidgetEnvelope::wrap(&callback, &json.to_string()))
    }
}

/// Answers the secondary login with a fresh generation cookie. Logins
/// after the first are delayed by `later_delay`.
pub struct GenerationResponder {
    generation: Arc<AtomicU64>,
    later_delay: Duration,
}

impl Respond for GenerationResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let template = ResponseTemplate::new(200)
            .insert_header("set-cookie", format!("aptus_gen={n}; Path=/").as_str());
        if n > 1 {
            template.set_delay(self.later_delay)
        } else {
            template
        }
    }
}

// ---------------------------------------------------------------------------
// MockPortal
// ---------------------------------------------------------------------------

pub struct MockPortal {
    pub server: MockServer,
    generation: Arc<AtomicU64>,
}

impl MockPortal {
    /// A server with nothing mounted.
    pub async fn bare() -> Self {
        Self {
            server: MockServer::start().await,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A portal on which the whole login sequence and every unlock succeed.
    pub async fn healthy() -> Self {
        Self::with_refresh_delay(Duration::ZERO).await
    }

    /// Like [`healthy`](Self::healthy), but every login after the first
    /// stalls on the secondary step for `delay`.
    pub async fn with_refresh_delay(delay: Duration) -> Self {
        let portal = Self::bare().await;
        portal.mount_primary_login().await;
        portal.mount_widgets().await;
        portal.mount_secondary_login(delay).await;
        portal.mount_unlock(200).await;
        portal
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.uri(), &self.uri()).unwrap()
    }

    /// Short timeouts, a refresh interval long enough to never fire
    /// unless a test asks for it.
    pub fn config(&self) -> SessionConfig {
        self.config_with_interval(Duration::from_secs(3600))
    }

    pub fn config_with_interval(&self, interval: Duration) -> SessionConfig {
        SessionConfig {
            refresh: TickConfig::every(interval),
            transport: TransportConfig {
                request_timeout: Duration::from_secs(2),
                connect_timeout: Duration::from_secs(1),
                ..TransportConfig::default()
            },
            endpoints: self.endpoints(),
        }
    }

    pub async fn mount_primary_login(&self) {
        Mock::given(method("POST"))
            .and(path("/wp-login.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "Fast2User_ssoId=sso-42; Path=/"),
            )
            .mount(&self.server)
            .await;
    }

    /// Widget responder pointing the secondary login at this server.
    pub fn widget_responder(&self) -> WidgetResponder {
        WidgetResponder {
            aptus_url: format!("{}{SECONDARY_LOGIN_PATH}", self.uri()),
        }
    }

    pub async fn mount_widgets(&self) {
        Mock::given(method("GET"))
            .and(path("/widgets/"))
            .respond_with(self.widget_responder())
            .mount(&self.server)
            .await;
    }

    pub async fn mount_secondary_login(&self, later_delay: Duration) {
        Mock::given(method("GET"))
            .and(path(SECONDARY_LOGIN_PATH))
            .respond_with(GenerationResponder {
                generation: Arc::clone(&self.generation),
                later_delay,
            })
            .mount(&self.server)
            .await;
    }

    pub async fn mount_unlock(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path_regex(format!("^{UNLOCK_PREFIX}[^/]+$")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of secondary logins answered so far.
    pub fn logins(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The `aptus_gen` cookie each unlock request carried, in arrival order.
    pub async fn unlock_generations(&self) -> Vec<u64> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().starts_with(UNLOCK_PREFIX))
            .filter_map(|r| generation_of(r))
            .collect()
    }

    /// Paths of every request received, in arrival order.
    pub async fn request_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }
}

fn generation_of(request: &Request) -> Option<u64> {
    let header = request.headers.get("cookie")?.to_str().ok()?;
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "aptus_gen")
        .and_then(|(_, value)| value.parse().ok())
}
