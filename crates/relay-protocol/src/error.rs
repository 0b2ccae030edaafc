//! Relay error taxonomy.
//!
//! Every variant is terminal where it is detected: the relay logs it and
//! moves on. Nothing here is ever reported back to the sending client.

use thiserror::Error;

/// Errors surfaced by envelope parsing, forwarding, and the transport.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound frame was not valid JSON.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),

    /// The inbound frame was JSON, but not an object.
    #[error("malformed envelope: expected an object, got {0}")]
    NotAnObject(&'static str),

    /// The envelope named a live recipient but carried no `Message`.
    #[error("envelope for {recipient} has no payload")]
    MissingPayload { recipient: String },

    /// The destination's writer has stopped; the frame was not queued.
    #[error("connection closed: {id}")]
    ConnectionClosed { id: String },

    /// The destination's outbound queue is full; the frame was dropped.
    #[error("outbound queue full for {id}")]
    QueueFull { id: String },

    /// A lower-level WebSocket read or write fault.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport could not bind its listener.
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),

    /// The configured listen address did not parse.
    #[error("invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// The endpoint path must be absolute.
    #[error("invalid endpoint path: {0:?} (must start with '/')")]
    InvalidPath(String),
}

impl RelayError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Parse failures are the only errors attributable to the sender's input.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedEnvelope(_) | Self::NotAnObject(_))
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
