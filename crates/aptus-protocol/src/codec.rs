//! The widget envelope.
//!
//! The portal's `/widgets/` endpoint answers in JSONP style: the JSON
//! payload is wrapped in a call to the callback named in the request,
//!
//! ```text
//! mjau({"data":{"aptuslogin@APTUSPORT":{"objekt":[{"aptusUrl":"..."}]}}});
//! └─5─┘                                                              └2┘
//! ```
//!
//! The callback name is always [`CALLBACK_LEN`] characters, so the
//! envelope is a fixed five-character prefix and two-character suffix
//! around the JSON. Everything that can go wrong while unwrapping it is
//! reported as a [`ProtocolError`], never a panic.

use serde_json::Value;

use crate::{ProtocolError, CALLBACK_LEN};

/// JSON pointer to the secondary login URL inside the widget payload.
const APTUS_URL_POINTER: &str = "/data/aptuslogin@APTUSPORT/objekt/0/aptusUrl";

/// Human-readable form of [`APTUS_URL_POINTER`], used in errors.
const APTUS_URL_PATH: &str = "data[\"aptuslogin@APTUSPORT\"][\"objekt\"][0][\"aptusUrl\"]";

/// A decoded widget response.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEnvelope {
    payload: Value,
}

impl WidgetEnvelope {
    /// Characters before the JSON: the callback name and `(`.
    pub const PREFIX_LEN: usize = CALLBACK_LEN + 1;
    /// Characters after the JSON: `);`.
    pub const SUFFIX_LEN: usize = 2;

    /// Strips the envelope and parses the JSON inside.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidEnvelope`] if the body cannot hold the
    ///   prefix and suffix.
    /// - [`ProtocolError::Decode`] if what remains is not JSON.
    pub fn decode(body: &str) -> Result<Self, ProtocolError> {
        let end = body
            .len()
            .checked_sub(Self::SUFFIX_LEN)
            .filter(|end| *end >= Self::PREFIX_LEN)
            .ok_or_else(|| {
                ProtocolError::InvalidEnvelope(format!(
                    "body is {} bytes, need at least {}",
                    body.len(),
                    Self::PREFIX_LEN + Self::SUFFIX_LEN
                ))
            })?;
        let json = body.get(Self::PREFIX_LEN..end).ok_or_else(|| {
            ProtocolError::InvalidEnvelope("envelope splits a character".into())
        })?;
        let payload = serde_json::from_str(json).map_err(ProtocolError::Decode)?;
        Ok(Self { payload })
    }

    /// Wraps a JSON document the way the portal does. Mainly useful for
    /// building mock responses.
    pub fn wrap(callback: &str, json: &str) -> String {
        format!("{callback}({json});")
    }

    /// The secondary login URL, `data["aptuslogin@APTUSPORT"]["objekt"][0]["aptusUrl"]`.
    ///
    /// # Errors
    /// [`ProtocolError::MissingField`] if any step of the path is absent
    /// or the final value is not a string.
    pub fn aptus_url(&self) -> Result<&str, ProtocolError> {
        self.payload
            .pointer(APTUS_URL_POINTER)
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingField(APTUS_URL_PATH))
    }
}
