/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed (TLS backend, bad
    /// configuration).
    #[error("client build failed: {0}")]
    Build(#[source] reqwest::Error),

    /// A request could not be sent or its body could not be read.
    /// Covers connection failures and timeouts.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Whether the failure was a request or connect timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Build(_) => false,
            Self::Request { source, .. } => source.is_timeout(),
        }
    }
}
