//! Error types for the protocol layer.
//!
//! Nothing here touches the network. A `ProtocolError` always means the
//! portal sent something we could not make sense of, or a configured URL
//! was not a valid base.

/// Errors that can occur while building URLs or decoding portal payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The widget body was too short to contain the fixed-length
    /// callback prefix and suffix, or they did not fall on character
    /// boundaries.
    #[error("widget envelope malformed: {0}")]
    InvalidEnvelope(String),

    /// The unwrapped envelope was not valid JSON.
    #[error("widget payload decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The JSON parsed, but the expected field was missing or had the
    /// wrong type.
    #[error("missing field {0} in widget payload")]
    MissingField(&'static str),

    /// A URL could not be parsed or joined onto a base.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
