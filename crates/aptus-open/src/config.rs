//! The secrets file: credentials, doors, and optional service settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use aptus_protocol::{Endpoints, ProtocolError, Secrets, DEFAULT_LOCK_URL, DEFAULT_PORTAL_URL};
use aptus_session::SessionConfig;
use aptus_tick::TickConfig;
use aptus_transport::TransportConfig;
use serde::Deserialize;

/// Errors from loading or validating the secrets file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid secrets file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no doors configured")]
    NoDoors,

    #[error("login username is empty")]
    EmptyUsername,

    #[error("refresh.{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("invalid portal url: {0}")]
    Portal(#[from] ProtocolError),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// The whole secrets file.
///
/// Only `[csb-login]` and `[[doors]]` are required; the other tables fall
/// back to production defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub secrets: Secrets,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[portal]`: where the two portal origins live.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_lock_url")]
    pub lock_url: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            lock_url: default_lock_url(),
        }
    }
}

/// `[refresh]`: session refresh cadence and request timeouts, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// `[server]`: where the HTTP front end listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, ready for `TcpListener::bind`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_PORTAL_URL.to_string()
}
fn default_lock_url() -> String {
    DEFAULT_LOCK_URL.to_string()
}
fn default_interval_secs() -> u64 {
    240
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    2138
}

impl Config {
    /// Reads, parses and validates the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), doors = config.secrets.doors.len(), "secrets file loaded");
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the service cannot run with.
    ///
    /// Duplicate door names are allowed: the front end refuses to pick
    /// one of them at request time. They are worth a warning here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secrets.credentials.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        if self.secrets.doors.is_empty() {
            return Err(ConfigError::NoDoors);
        }
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("interval_secs"));
        }
        if self.refresh.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_secs"));
        }
        if self.refresh.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("connect_timeout_secs"));
        }
        for name in self.secrets.duplicate_names() {
            tracing::warn!(door = name, "several doors share this name; requests for it will be refused");
        }
        Ok(())
    }

    /// The session manager settings this file describes.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig {
            refresh: TickConfig::every(Duration::from_secs(self.refresh.interval_secs)),
            transport: TransportConfig {
                request_timeout: Duration::from_secs(self.refresh.request_timeout_secs),
                connect_timeout: Duration::from_secs(self.refresh.connect_timeout_secs),
                ..TransportConfig::default()
            },
            endpoints: Endpoints::new(&self.portal.base_url, &self.portal.lock_url)?,
        })
    }
}
