//! Envelope wire format.
//!
//! Inbound frames look like:
//!
//! ```json
//! { "Userid": "<recipient connection id>", "Message": "<opaque payload>" }
//! ```
//!
//! Unknown fields are ignored. The recipient receives the raw `Message`
//! value as a text frame; the envelope itself is never re-sent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{RelayError, RelayResult};

/// A client-to-client message addressed by connection id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Registry key of the destination connection.
    #[serde(
        rename = "Userid",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub recipient_id: Option<String>,
    /// Content forwarded verbatim.
    #[serde(
        rename = "Message",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub payload: Option<String>,
}

impl Envelope {
    pub fn new(recipient_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            recipient_id: Some(recipient_id.into()),
            payload: Some(payload.into()),
        }
    }

    /// Parse an inbound text frame.
    ///
    /// `Ok(None)` means the frame was a JSON `null`: there is nothing to route.
    /// Anything that is not JSON, or is JSON but not an object, is an error.
    pub fn parse(text: &str) -> RelayResult<Option<Self>> {
        match serde_json::from_str::<Value>(text)? {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(serde_json::from_value(Value::Object(map))?)),
            Value::Array(_) => Err(RelayError::NotAnObject("array")),
            Value::String(_) => Err(RelayError::NotAnObject("string")),
            Value::Number(_) => Err(RelayError::NotAnObject("number")),
            Value::Bool(_) => Err(RelayError::NotAnObject("bool")),
        }
    }

    /// The routing key, if present and non-empty.
    pub fn recipient(&self) -> Option<&str> {
        self.recipient_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// Accept any scalar where a string is expected; `null` reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// First frame sent to a new connection so it can learn its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Welcome {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

impl Welcome {
    pub const KIND: &'static str = "connected";

    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            kind: Self::KIND.into(),
            client_id: client_id.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Two string fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
