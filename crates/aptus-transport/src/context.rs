//! `ClientContext` and the factory that builds them.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Client, Response};
use url::Url;

use crate::TransportError;

/// Counter for generating unique context IDs.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a client context, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TransportConfig
// ---------------------------------------------------------------------------

/// Settings applied to every client a factory builds.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on a whole request, from connect to the last body byte.
    pub request_timeout: Duration,
    /// Upper bound on establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("aptus-open/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingJar
// ---------------------------------------------------------------------------

/// A [`Jar`] that also remembers the name of every cookie stored in it.
///
/// `Jar` can only answer "what would be sent to this URL", which misses
/// cookies scoped to another path or set on a redirect hop. The name set
/// covers all of them. A `Set-Cookie` that expires a cookie on arrival
/// removes its name again.
#[derive(Default)]
struct RecordingJar {
    jar: Jar,
    names: Mutex<BTreeSet<String>>,
}

impl RecordingJar {
    fn contains(&self, name: &str) -> bool {
        self.names.lock().map(|names| names.contains(name)).unwrap_or(false)
    }

    fn names(&self) -> Vec<String> {
        self.names
            .lock()
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, header: &HeaderValue) {
        let Ok(raw) = header.to_str() else {
            return;
        };
        let mut parts = raw.split(';');
        let Some((name, _)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let expired = parts.filter_map(|attr| attr.split_once('=')).any(|(key, value)| {
            key.trim().eq_ignore_ascii_case("max-age")
                && value.trim().parse::<i64>().is_ok_and(|secs| secs <= 0)
        });

        if let Ok(mut names) = self.names.lock() {
            if expired {
                names.remove(name);
            } else {
                names.insert(name.to_string());
            }
        }
    }
}

impl CookieStore for RecordingJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        for header in &headers {
            self.record(header);
        }
        self.jar.set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

// ---------------------------------------------------------------------------
// ContextFactory
// ---------------------------------------------------------------------------

/// Builds fresh [`ClientContext`]s and counts the ones still alive.
///
/// Cheap to share: the live counter is behind an `Arc`, and every context
/// holds a handle to it so it can decrement the count when dropped.
#[derive(Debug, Clone)]
pub struct ContextFactory {
    config: TransportConfig,
    live: Arc<AtomicUsize>,
}

impl ContextFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builds a new context with an empty cookie jar.
    ///
    /// # Errors
    /// [`TransportError::Build`] if `reqwest` cannot construct the client.
    pub fn create(&self) -> Result<ClientContext, TransportError> {
        let jar = Arc::new(RecordingJar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(TransportError::Build)?;

        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        let live = self.live.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(context = %id, live, "client context created");

        Ok(ClientContext {
            id,
            client,
            jar,
            release: Release {
                id,
                live: Arc::clone(&self.live),
            },
        })
    }

    /// Number of contexts built by this factory that have not been
    /// dropped yet.
    pub fn live_contexts(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for ContextFactory {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

// ---------------------------------------------------------------------------
// ClientContext
// ---------------------------------------------------------------------------

/// An HTTP client with a private cookie jar.
///
/// Not `Clone`: a context has exactly one owner at a time and is released
/// exactly once, when that owner drops it (or calls [`close`](Self::close)).
pub struct ClientContext {
    id: ContextId,
    client: Client,
    jar: Arc<RecordingJar>,
    release: Release,
}

impl ClientContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Sends a `GET` and returns the response whatever its status.
    pub async fn get(&self, url: Url) -> Result<Response, TransportError> {
        let label = url.to_string();
        self.client
            .get(url)
            .send()
            .await
            .map_err(|source| TransportError::Request { url: label, source })
    }

    /// Sends a form-encoded `POST` and returns the response whatever its
    /// status.
    pub async fn post_form(
        &self,
        url: Url,
        form: &[(&str, &str)],
    ) -> Result<Response, TransportError> {
        let label = url.to_string();
        self.client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|source| TransportError::Request { url: label, source })
    }

    /// Reads a response body as text.
    pub async fn text(response: Response) -> Result<String, TransportError> {
        let label = response.url().to_string();
        response
            .text()
            .await
            .map_err(|source| TransportError::Request { url: label, source })
    }

    /// Whether the jar holds a cookie called `name`, for any domain or
    /// path.
    pub fn has_cookie(&self, name: &str) -> bool {
        self.jar.contains(name)
    }

    /// Sorted names of every cookie in the jar.
    pub fn cookie_names(&self) -> Vec<String> {
        self.jar.names()
    }

    /// Releases the context. Equivalent to dropping it, but reads better
    /// at call sites where the release is the point.
    pub fn close(self) {
        tracing::debug!(context = %self.id, "client context closed");
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Decrements the factory's live count when the owning context drops.
///
/// Lives in its own type so the decrement happens on every exit path,
/// including early `?` returns and task cancellation.
struct Release {
    id: ContextId,
    live: Arc<AtomicUsize>,
}

impl Drop for Release {
    fn drop(&mut self) {
        let live = self.live.fetch_sub(1, Ordering::AcqRel) - 1;
        tracing::trace!(context = %self.id, live, "client context released");
    }
}
